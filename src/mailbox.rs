use crossbeam_channel::{bounded, Receiver, Sender, TryRecvError, TrySendError};

use crate::command::Command;
use crate::error::SubmitError;

/// Creates the single-slot channel between the front end and the engine.
pub fn mailbox() -> (CommandSender, Mailbox) {
    let (tx, rx) = bounded(1);
    (CommandSender { tx }, Mailbox { rx })
}

#[derive(Debug, Clone)]
pub struct CommandSender {
    tx: Sender<Command>,
}

impl CommandSender {
    /// Never blocks. A command is refused if the previous one has not been
    /// taken yet.
    pub fn submit(&self, command: Command) -> Result<(), SubmitError> {
        self.tx.try_send(command).map_err(|e| match e {
            TrySendError::Full(command) => SubmitError::Busy(command),
            TrySendError::Disconnected(command) => SubmitError::Closed(command),
        })
    }

    /// Delivers the poison command, waiting for the slot if it is taken.
    pub fn stop(&self) {
        // An engine that already exited has nothing to stop.
        let _ = self.tx.send(Command::Stop);
    }
}

#[derive(Debug)]
pub struct Mailbox {
    rx: Receiver<Command>,
}

impl Mailbox {
    /// Blocks until a command arrives. A mailbox with no senders left
    /// behaves as if it was told to stop.
    pub fn take(&self) -> Command {
        self.rx.recv().unwrap_or(Command::Stop)
    }

    pub fn poll(&self) -> Option<Command> {
        match self.rx.try_recv() {
            Ok(command) => Some(command),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => Some(Command::Stop),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn second_submit_is_refused_without_blocking() {
        let (sender, mailbox) = mailbox();
        sender.submit(Command::from_input("e2e4").unwrap()).unwrap();

        let refused = sender.submit(Command::from_input("d2d4").unwrap());
        match refused {
            Err(SubmitError::Busy(command)) => assert_eq!(command.to_string(), "d2d4"),
            other => panic!("expected busy, got {other:?}"),
        }

        assert_eq!(mailbox.take().to_string(), "e2e4");
        assert_eq!(mailbox.poll(), None);
    }

    #[test]
    fn slot_frees_up_once_taken() {
        let (sender, mailbox) = mailbox();
        sender.submit(Command::Halt).unwrap();
        assert_eq!(mailbox.poll(), Some(Command::Halt));
        sender.submit(Command::Halt).unwrap();
    }

    #[test]
    fn stop_waits_for_the_slot() {
        let (sender, mailbox) = mailbox();
        sender.submit(Command::from_input("sf").unwrap()).unwrap();

        let consumer = thread::spawn(move || {
            thread::sleep(Duration::from_millis(20));
            let first = mailbox.take();
            let second = mailbox.take();
            (first, second)
        });
        sender.stop();

        let (first, second) = consumer.join().unwrap();
        assert_eq!(first.to_string(), "sf");
        assert_eq!(second, Command::Stop);
    }

    #[test]
    fn dropped_senders_read_as_stop() {
        let (sender, mailbox) = mailbox();
        drop(sender);
        assert_eq!(mailbox.take(), Command::Stop);
        assert_eq!(mailbox.poll(), Some(Command::Stop));
        let (sender, mailbox) = super::mailbox();
        drop(mailbox);
        assert!(matches!(sender.submit(Command::Halt), Err(SubmitError::Closed(_))));
    }
}

use crossbeam_channel::{unbounded, Receiver, RecvTimeoutError};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;
use std::process::{Child, ChildStdin, Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

use crate::error::EngineError;

/// Something that can suggest the best move for a position.
pub trait Analyzer: Send {
    /// Searches `fen` to `depth` (or the configured depth). `Ok(None)` means
    /// the engine has no move to offer.
    fn best_move(&mut self, fen: &str, depth: Option<u32>) -> Result<Option<String>, EngineError>;

    /// The last informational line the engine printed before its answer.
    fn last_info(&self) -> Option<&str>;

    fn depth(&self) -> u32;

    fn set_depth(&mut self, depth: u32);

    fn new_game(&mut self) -> Result<(), EngineError> {
        Ok(())
    }
}

/// The client side of the UCI conversation. Commands go out through
/// `writer`, engine output arrives one line at a time on `lines`.
pub struct UciSession<W: Write> {
    writer: W,
    lines: Receiver<String>,
    depth: u32,
    timeout: Duration,
    info: Option<String>,
}

impl<W: Write> UciSession<W> {
    pub fn new(writer: W, lines: Receiver<String>, depth: u32, timeout: Duration) -> Self {
        Self {
            writer,
            lines,
            depth,
            timeout,
            info: None,
        }
    }

    pub fn handshake(&mut self) -> Result<(), EngineError> {
        self.send("uci")?;
        self.wait_for("uciok")?;
        self.sync()
    }

    pub fn sync(&mut self) -> Result<(), EngineError> {
        self.send("isready")?;
        self.wait_for("readyok")
    }

    pub fn set_position(&mut self, fen: &str) -> Result<(), EngineError> {
        self.send(&format!("position fen {}", fen))
    }

    pub fn best_move(&mut self, fen: &str, depth: Option<u32>) -> Result<Option<String>, EngineError> {
        // A late answer to an earlier query always comes before this readyok
        self.discard_stale();
        self.sync()?;

        let depth = depth.unwrap_or(self.depth);
        self.set_position(fen)?;
        self.send(&format!("go depth {}", depth))?;

        let deadline = Instant::now() + self.timeout;
        let mut last_line: Option<String> = None;
        loop {
            let line = self.next_line(deadline)?;
            let mut tokens = line.split_whitespace();

            match tokens.next() {
                Some("bestmove") => {
                    self.info = last_line;
                    return match tokens.next() {
                        Some("(none)") | Some("0000") => Ok(None),
                        Some(mv) => Ok(Some(mv.to_string())),
                        None => Err(EngineError::Protocol(line.clone())),
                    };
                }
                Some(_) => last_line = Some(line.clone()),
                None => {}
            }
        }
    }

    pub fn send(&mut self, command: &str) -> Result<(), EngineError> {
        debug!("engine <- {}", command);
        writeln!(self.writer, "{}", command)?;
        self.writer.flush()?;
        Ok(())
    }

    fn wait_for(&mut self, token: &str) -> Result<(), EngineError> {
        let deadline = Instant::now() + self.timeout;
        loop {
            if self.next_line(deadline)?.trim() == token {
                return Ok(());
            }
        }
    }

    fn next_line(&mut self, deadline: Instant) -> Result<String, EngineError> {
        let remaining = deadline.saturating_duration_since(Instant::now());
        match self.lines.recv_timeout(remaining) {
            Ok(line) => {
                debug!("engine -> {}", line);
                Ok(line)
            }
            Err(RecvTimeoutError::Timeout) => {
                // Ask the engine to finish; its late answer is discarded by the next query.
                if let Err(e) = self.send("stop") {
                    warn!("could not interrupt engine: {}", e);
                }
                Err(EngineError::Timeout(self.timeout))
            }
            Err(RecvTimeoutError::Disconnected) => Err(EngineError::Exited),
        }
    }

    fn discard_stale(&mut self) {
        for line in self.lines.try_iter() {
            debug!("discarding stale engine output: {}", line);
        }
    }
}

impl<W: Write + Send> Analyzer for UciSession<W> {
    fn best_move(&mut self, fen: &str, depth: Option<u32>) -> Result<Option<String>, EngineError> {
        UciSession::best_move(self, fen, depth)
    }

    fn last_info(&self) -> Option<&str> {
        self.info.as_deref()
    }

    fn depth(&self) -> u32 {
        self.depth
    }

    fn set_depth(&mut self, depth: u32) {
        self.depth = depth;
    }

    fn new_game(&mut self) -> Result<(), EngineError> {
        self.send("ucinewgame")?;
        self.sync()
    }
}

/// A UCI engine running as a child process.
pub struct UciEngine {
    child: Child,
    session: UciSession<BufWriter<ChildStdin>>,
}

impl UciEngine {
    pub fn spawn(path: &Path, depth: u32, timeout: Duration) -> Result<Self, EngineError> {
        let mut child = Command::new(path)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|source| EngineError::Spawn {
                path: path.display().to_string(),
                source,
            })?;

        let (Some(stdin), Some(stdout)) = (child.stdin.take(), child.stdout.take()) else {
            abandon(&mut child);
            return Err(EngineError::Exited);
        };

        let (tx, rx) = unbounded();
        let reader = thread::Builder::new()
            .name("uci-reader".to_string())
            .spawn(move || {
                for line in BufReader::new(stdout).lines() {
                    let Ok(line) = line else { break };
                    if tx.send(line).is_err() {
                        break;
                    }
                }
            });
        if let Err(e) = reader {
            abandon(&mut child);
            return Err(e.into());
        }

        let mut session = UciSession::new(BufWriter::new(stdin), rx, depth, timeout);
        if let Err(e) = session.handshake() {
            abandon(&mut child);
            return Err(e);
        }

        Ok(Self { child, session })
    }
}

fn abandon(child: &mut Child) {
    let _ = child.kill();
    let _ = child.wait();
}

impl Analyzer for UciEngine {
    fn best_move(&mut self, fen: &str, depth: Option<u32>) -> Result<Option<String>, EngineError> {
        self.session.best_move(fen, depth)
    }

    fn last_info(&self) -> Option<&str> {
        self.session.last_info()
    }

    fn depth(&self) -> u32 {
        self.session.depth()
    }

    fn set_depth(&mut self, depth: u32) {
        self.session.set_depth(depth);
    }

    fn new_game(&mut self) -> Result<(), EngineError> {
        self.session.new_game()
    }
}

impl Drop for UciEngine {
    fn drop(&mut self) {
        let _ = self.session.send("quit");

        let deadline = Instant::now() + Duration::from_millis(500);
        while Instant::now() < deadline {
            match self.child.try_wait() {
                Ok(Some(_)) => return,
                Ok(None) => thread::sleep(Duration::from_millis(10)),
                Err(_) => break,
            }
        }
        abandon(&mut self.child);
    }
}

/// Stands in for a missing engine binary; every query fails.
pub struct Unavailable {
    depth: u32,
}

impl Unavailable {
    pub fn new(depth: u32) -> Self {
        Self { depth }
    }
}

impl Analyzer for Unavailable {
    fn best_move(&mut self, _fen: &str, _depth: Option<u32>) -> Result<Option<String>, EngineError> {
        Err(EngineError::Unavailable)
    }

    fn last_info(&self) -> Option<&str> {
        None
    }

    fn depth(&self) -> u32 {
        self.depth
    }

    fn set_depth(&mut self, depth: u32) {
        self.depth = depth;
    }
}

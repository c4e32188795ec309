use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use crate::board::{color_name, Board};

/// Receives a freshly rendered position after every change the engine
/// wants shown. Called from the engine thread.
pub trait BoardView: Send {
    fn refresh(&self, rendered: &str);
}

impl<F> BoardView for F
where
    F: Fn(&str) + Send,
{
    fn refresh(&self, rendered: &str) {
        self(rendered)
    }
}

pub struct ConsoleView;

impl BoardView for ConsoleView {
    fn refresh(&self, rendered: &str) {
        println!("{}", rendered);
    }
}

pub fn render(board: &Board) -> String {
    format!("{}{} to move | {}", board, color_name(board.turn()), board.fen())
}

/// Writes the rendered board to `board.txt` in `dir`, or to the first free
/// `board-N.txt` if that name is taken.
pub fn export(dir: &Path, rendered: &str) -> io::Result<PathBuf> {
    let mut suffix = 0u32;
    loop {
        let name = if suffix == 0 {
            "board.txt".to_string()
        } else {
            format!("board-{}.txt", suffix)
        };
        let path = dir.join(name);

        match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(mut file) => {
                file.write_all(rendered.as_bytes())?;
                file.write_all(b"\n")?;
                return Ok(path);
            }
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => suffix += 1,
            Err(e) => return Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn scratch_dir() -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        let dir = std::env::temp_dir().join(format!("chessdesk-view-{}-{}", std::process::id(), nanos));
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn export_never_overwrites() {
        let dir = scratch_dir();
        let first = export(&dir, "one").unwrap();
        let second = export(&dir, "two").unwrap();
        let third = export(&dir, "three").unwrap();

        assert_eq!(first.file_name().unwrap(), "board.txt");
        assert_eq!(second.file_name().unwrap(), "board-1.txt");
        assert_eq!(third.file_name().unwrap(), "board-2.txt");
        assert_eq!(fs::read_to_string(&first).unwrap(), "one\n");
        assert_eq!(fs::read_to_string(&third).unwrap(), "three\n");

        fs::remove_dir_all(dir).unwrap();
    }

    #[test]
    fn render_names_the_side_to_move() {
        let rendered = render(&Board::new());
        assert!(rendered.starts_with("r n b q k b n r\n"));
        assert!(rendered.ends_with(
            "White to move | rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1"
        ));
    }
}

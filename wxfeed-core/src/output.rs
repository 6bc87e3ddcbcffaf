use std::{
    fs::OpenOptions,
    io::{self, Write},
    path::PathBuf,
};

/// Destination for rendered lines.
pub trait LineSink {
    fn write_line(&mut self, line: &str) -> io::Result<()>;
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Output {
    #[default]
    Stdout,
    /// Append to a file; the file is opened and closed for every line.
    Append(PathBuf),
}

impl LineSink for Output {
    fn write_line(&mut self, line: &str) -> io::Result<()> {
        match self {
            Output::Stdout => {
                let mut out = io::stdout().lock();
                writeln!(out, "{line}")?;
                out.flush()
            }
            Output::Append(path) => {
                let mut file = OpenOptions::new().create(true).append(true).open(path)?;
                writeln!(file, "{line}")?;
                file.flush()
            }
        }
    }
}

impl LineSink for Vec<String> {
    fn write_line(&mut self, line: &str) -> io::Result<()> {
        self.push(line.to_string());
        Ok(())
    }
}

use anyhow::{Context, Result};
use chrono::NaiveDate;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Daily markdown log of submitted commands and the replies they produced.
/// Each entry goes to the file for the day it was written on, so a session
/// that crosses midnight rolls over to a new file.
pub struct Journal {
    dir: PathBuf,
}

impl Journal {
    pub fn open(home: &Path) -> Result<Self> {
        let dir = home.join("journal");
        fs::create_dir_all(&dir).with_context(|| format!("create {}", dir.display()))?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, day: NaiveDate) -> PathBuf {
        self.dir.join(format!("{}.md", day.format("%Y-%m-%d")))
    }

    pub fn append_command(&mut self, day: NaiveDate, command: &str) -> Result<()> {
        self.append(day, "command", command)
    }

    pub fn append_reply(&mut self, day: NaiveDate, message: &str) -> Result<()> {
        self.append(day, "system", message)
    }

    fn append(&mut self, day: NaiveDate, role: &str, msg: &str) -> Result<()> {
        let path = self.path_for(day);
        let mut f = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .with_context(|| format!("open {}", path.display()))?;
        writeln!(
            f,
            "- {} [{}] {}",
            chrono::Utc::now().to_rfc3339(),
            role,
            msg.replace('\n', " ")
        )?;
        Ok(())
    }
}

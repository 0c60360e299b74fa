// src/model.rs

/// A commit that touched the target file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitRecord {
    /// The full commit hash as printed by git
    pub hash: String,
    /// The subject line, possibly empty
    pub message: String,
}

impl CommitRecord {
    pub fn new(hash: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            hash: hash.into(),
            message: message.into(),
        }
    }

    /// Parses a `<hash> <message>` header line. Only the first space splits,
    /// the rest of the line is the message.
    pub fn from_header(line: &str) -> Self {
        match line.split_once(' ') {
            Some((hash, message)) => Self::new(hash, message),
            None => Self::new(line, ""),
        }
    }

    /// The abbreviated hash used for labels
    pub fn short_hash(&self) -> &str {
        match self.hash.char_indices().nth(7) {
            Some((idx, _)) => &self.hash[..idx],
            None => &self.hash,
        }
    }
}

/// Commits in `git log` order, most recent first
pub type CommitList = Vec<CommitRecord>;

//! Ordered header collection.
//!
//! Names are matched case-insensitively but keep the casing they were
//! inserted with, and entries serialize in insertion order.

use std::io::Write;

use tracing::debug;

use crate::http::writer::WriteError;

pub(crate) const CONTENT_LENGTH: &str = "Content-Length";

fn assert_name(name: &str) {
    assert!(
        !name.is_empty() && !name.contains([':', '\r', '\n']),
        "invalid header name {:?}",
        name
    );
}

fn assert_value(value: &str) {
    assert!(
        !value.contains(['\r', '\n']),
        "header value must not contain line breaks: {:?}",
        value
    );
}

/// Header block of a message as ordered `Name: value` pairs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Headers {
    entries: Vec<(String, String)>,
}

impl Headers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends every `Name: value` line in `text`.
    ///
    /// Accepts `\n` and `\r\n` line endings. Names and values are trimmed,
    /// blank lines are ignored, and lines without a colon or with a stray
    /// `\r` are skipped.
    pub fn parse(&mut self, text: &str) {
        for line in text.lines() {
            if line.trim().is_empty() {
                continue;
            }

            match line.split_once(':') {
                Some((name, value)) if !name.trim().is_empty() && !line.contains('\r') => {
                    self.append(name.trim(), value.trim());
                }
                _ => debug!(line, "skipping malformed header line"),
            }
        }
    }

    /// Value of the first header named `name`.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Sets or removes a header.
    ///
    /// `Some` replaces the first entry named `name` and drops any later
    /// duplicates, or appends a new entry. `None` removes every entry named
    /// `name`. Names and values are trimmed, as [`Headers::parse`] does.
    ///
    /// # Panics
    ///
    /// If the name is empty or contains `:` or a line break, or the value
    /// contains a line break.
    pub fn set<V: Into<String>>(&mut self, name: &str, value: Option<V>) {
        let name = name.trim();
        let Some(value) = value else {
            self.entries.retain(|(key, _)| !key.eq_ignore_ascii_case(name));
            return;
        };

        assert_name(name);
        let value = value.into().trim().to_string();
        assert_value(&value);
        match self
            .entries
            .iter()
            .position(|(key, _)| key.eq_ignore_ascii_case(name))
        {
            Some(first) => {
                self.entries[first].1 = value;
                let mut index = 0;
                self.entries.retain(|(key, _)| {
                    let keep = index <= first || !key.eq_ignore_ascii_case(name);
                    index += 1;
                    keep
                });
            }
            None => self.entries.push((name.to_string(), value)),
        }
    }

    /// Adds an entry without touching existing ones. Same trimming and
    /// panics as [`Headers::set`].
    pub fn append(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into().trim().to_string();
        let value = value.into().trim().to_string();
        assert_name(&name);
        assert_value(&value);
        self.entries.push((name, value));
    }

    /// Removes every entry named `name`, returning the first value.
    pub fn remove(&mut self, name: &str) -> Option<String> {
        let first = self.get(name).map(str::to_string);
        self.set::<String>(name, None);
        first
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> + Clone {
        self.entries
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Exact number of bytes [`Headers::write_into`] produces, including the
    /// blank-line terminator.
    pub fn serialized_size(&self) -> usize {
        lines_size(self.iter())
    }

    /// Writes `Name: value\r\n` per entry followed by `\r\n`.
    ///
    /// Nothing is written if `dest` is shorter than
    /// [`Headers::serialized_size`].
    pub fn write_into(&self, dest: &mut [u8]) -> Result<usize, WriteError> {
        write_lines(self.iter(), dest)
    }

    /// Entries as they go on the wire in front of a body: `Content-Length`
    /// carries `content_length`, keeps the position of its first entry (or
    /// goes last) and is left out entirely when there is no body.
    fn framed<'a>(&'a self, content_length: Option<&'a str>) -> Vec<(&'a str, &'a str)> {
        let mut lines = Vec::with_capacity(self.entries.len() + 1);
        let mut declared = false;

        for (name, value) in self.iter() {
            if !name.eq_ignore_ascii_case(CONTENT_LENGTH) {
                lines.push((name, value));
            } else if let Some(length) = content_length.filter(|_| !declared) {
                lines.push((name, length));
                declared = true;
            }
        }

        if let Some(length) = content_length.filter(|_| !declared) {
            lines.push((CONTENT_LENGTH, length));
        }
        lines
    }

    pub(crate) fn framed_size(&self, content_length: Option<&str>) -> usize {
        lines_size(self.framed(content_length).into_iter())
    }

    pub(crate) fn write_framed_into(
        &self,
        content_length: Option<&str>,
        dest: &mut [u8],
    ) -> Result<usize, WriteError> {
        write_lines(self.framed(content_length).into_iter(), dest)
    }
}

fn lines_size<'a>(lines: impl Iterator<Item = (&'a str, &'a str)>) -> usize {
    let size: usize = lines
        .map(|(name, value)| name.len() + 2 + value.len() + 2)
        .sum();
    size + 2
}

fn write_lines<'a>(
    lines: impl Iterator<Item = (&'a str, &'a str)> + Clone,
    dest: &mut [u8],
) -> Result<usize, WriteError> {
    let needed = lines_size(lines.clone());
    if dest.len() < needed {
        return Err(WriteError::BufferTooSmall {
            needed,
            available: dest.len(),
        });
    }

    let mut cursor = &mut dest[..needed];
    for (name, value) in lines {
        write!(cursor, "{}: {}\r\n", name, value)?;
    }
    cursor.write_all(b"\r\n")?;

    Ok(needed)
}

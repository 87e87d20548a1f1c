//! Env file format
//!
//! `KEY="value"` lines, one per pair. Inside double quotes `\`, `"` and `$`
//! are backslash-escaped, which both docker compose and the parser below
//! understand. Values with line breaks are rejected.

use crate::Error;

/// Ordered key/value pairs of an env file
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvFile {
    entries: Vec<(String, String)>,
}

impl EnvFile {
    /// Create an empty file
    pub fn new() -> Self {
        Self::default()
    }

    /// Set `key`, replacing an existing value in place
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    /// Builder form of [`EnvFile::set`]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.set(key, value);
        self
    }

    /// Look up a value
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// All pairs in file order
    pub fn entries(&self) -> &[(String, String)] {
        &self.entries
    }

    /// Number of pairs
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the file has no pairs
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Render the file contents
    ///
    /// # Errors
    ///
    /// `Error::Validation` for an invalid key or a value with a line break.
    pub fn render(&self) -> Result<String, Error> {
        let mut out = String::new();
        for (key, value) in &self.entries {
            validate_key(key)?;
            if value.contains('\n') || value.contains('\r') {
                return Err(Error::validation(format!(
                    "value of {} cannot contain line breaks",
                    key
                )));
            }
            out.push_str(key);
            out.push_str("=\"");
            out.push_str(&escape(value));
            out.push_str("\"\n");
        }
        Ok(out)
    }

    /// Parse env file contents
    ///
    /// Accepts what [`EnvFile::render`] writes plus the common hand-edited
    /// forms: comments, blank lines, `export KEY=...`, single-quoted and
    /// unquoted values.
    pub fn parse(text: &str) -> Result<Self, Error> {
        let mut file = EnvFile::new();

        for (index, raw) in text.lines().enumerate() {
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let line = line.strip_prefix("export ").unwrap_or(line);

            let (key, rest) = line.split_once('=').ok_or_else(|| {
                Error::config(format!("line {}: expected KEY=value", index + 1))
            })?;
            let key = key.trim();
            validate_key(key)
                .map_err(|e| Error::config(format!("line {}: {}", index + 1, e)))?;

            let value = parse_value(rest.trim())
                .map_err(|msg| Error::config(format!("line {}: {}", index + 1, msg)))?;
            file.set(key, value);
        }

        Ok(file)
    }
}

impl From<Vec<(String, String)>> for EnvFile {
    fn from(pairs: Vec<(String, String)>) -> Self {
        let mut file = EnvFile::new();
        for (key, value) in pairs {
            file.set(key, value);
        }
        file
    }
}

fn validate_key(key: &str) -> Result<(), Error> {
    let mut chars = key.chars();
    let valid = match chars.next() {
        Some(first) => {
            (first.is_ascii_alphabetic() || first == '_')
                && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        None => false,
    };

    if valid {
        Ok(())
    } else {
        Err(Error::validation(format!("invalid env key '{}'", key)))
    }
}

fn escape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, '\\' | '"' | '$') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

fn parse_value(raw: &str) -> Result<String, String> {
    if let Some(body) = raw.strip_prefix('"') {
        let mut out = String::with_capacity(body.len());
        let mut chars = body.chars();
        while let Some(c) = chars.next() {
            match c {
                '\\' => match chars.next() {
                    Some('n') => out.push('\n'),
                    Some(other) => out.push(other),
                    None => return Err("dangling escape".to_string()),
                },
                '"' => {
                    let trailing = chars.as_str().trim();
                    if !trailing.is_empty() && !trailing.starts_with('#') {
                        return Err(format!("unexpected text after quote: {}", trailing));
                    }
                    return Ok(out);
                }
                other => out.push(other),
            }
        }
        return Err("unterminated double quote".to_string());
    }

    if let Some(body) = raw.strip_prefix('\'') {
        return match body.split_once('\'') {
            Some((value, _)) => Ok(value.to_string()),
            None => Err("unterminated single quote".to_string()),
        };
    }

    let value = match raw.find(" #") {
        Some(pos) => &raw[..pos],
        None => raw,
    };
    Ok(value.trim().to_string())
}

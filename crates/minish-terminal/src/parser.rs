//! Command line parsing.
//!
//! A line is a leading run of word characters (the command name) followed by
//! whitespace-separated arguments. There is no quoting or expansion.

use minish_types::error::ParseError;

/// Ordered command arguments with explicit indexed access.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Args(Vec<String>);

impl Args {
    /// Argument at `index`, or `None` when fewer arguments were given.
    pub fn get(&self, index: usize) -> Option<&str> {
        self.0.get(index).map(String::as_str)
    }

    /// Argument at `index`, or `default` when it is absent.
    pub fn get_or<'a>(&'a self, index: usize, default: &'a str) -> &'a str {
        self.get(index).unwrap_or(default)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

impl<'a> FromIterator<&'a str> for Args {
    fn from_iter<I: IntoIterator<Item = &'a str>>(iter: I) -> Self {
        Self(iter.into_iter().map(str::to_string).collect())
    }
}

/// A command name (lowercased) and its arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedCommand {
    pub name: String,
    pub args: Args,
}

/// ASCII letters, digits and `_`.
fn is_word_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// Split a line into a command name and arguments.
///
/// The name is the leading run of word characters, so `ls-la` parses as
/// `ls` with argument `-la`. A line that is empty or starts with anything
/// else (including whitespace) has no command.
pub fn parse(line: &str) -> Result<ParsedCommand, ParseError> {
    let line = line.strip_suffix('\n').unwrap_or(line);
    let line = line.strip_suffix('\r').unwrap_or(line);

    let split = line.find(|c: char| !is_word_char(c)).unwrap_or(line.len());
    if split == 0 {
        return Err(ParseError::NoCommand);
    }
    let (head, rest) = line.split_at(split);

    // `split_whitespace` never yields empty tokens, so a bare command gets
    // zero arguments rather than `[""]`.
    Ok(ParsedCommand {
        name: head.to_lowercase(),
        args: rest.split_whitespace().collect(),
    })
}

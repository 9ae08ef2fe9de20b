//! Streaming JSON output

use error_stack::Report;
use serde_json::Number;

use crate::error::{Error, Result};

/// Event-style JSON writer driven by serializers
pub trait JsonGenerator {
    /// Open an object
    ///
    /// # Errors
    ///
    /// Returns an error when a value is not allowed at this position.
    fn write_start_object(&mut self) -> Result<()>;
    /// Close the innermost object
    ///
    /// # Errors
    ///
    /// Returns an error when no object is open or its last key has no value.
    fn write_end_object(&mut self) -> Result<()>;
    /// Open an array
    ///
    /// # Errors
    ///
    /// Returns an error when a value is not allowed at this position.
    fn write_start_array(&mut self) -> Result<()>;
    /// Close the innermost array
    ///
    /// # Errors
    ///
    /// Returns an error when no array is open.
    fn write_end_array(&mut self) -> Result<()>;
    /// Write an object key; the next value event belongs to it
    ///
    /// # Errors
    ///
    /// Returns an error when the innermost container is not an object awaiting a key.
    fn write_key(&mut self, key: &str) -> Result<()>;
    /// Write `null`
    ///
    /// # Errors
    ///
    /// Returns an error when a value is not allowed at this position.
    fn write_null(&mut self) -> Result<()>;
    /// Write `true` or `false`
    ///
    /// # Errors
    ///
    /// Returns an error when a value is not allowed at this position.
    fn write_bool(&mut self, value: bool) -> Result<()>;
    /// Write a number as given
    ///
    /// # Errors
    ///
    /// Returns an error when a value is not allowed at this position.
    fn write_number(&mut self, value: &Number) -> Result<()>;
    /// Write an escaped string
    ///
    /// # Errors
    ///
    /// Returns an error when a value is not allowed at this position.
    fn write_string(&mut self, value: &str) -> Result<()>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Scope {
    Object,
    Array,
}

#[derive(Debug)]
struct Frame {
    scope:   Scope,
    members: usize,
}

/// Writes compact JSON text into a `String`, checking that events are well nested
#[derive(Debug, Default)]
pub struct CompactJsonGenerator {
    out:          String,
    frames:       Vec<Frame>,
    after_key:    bool,
    root_written: bool,
}

fn misuse(what: &str) -> Report<Error> {
    Report::new(Error::Serialization(format!("malformed JSON event sequence: {what}")))
}

impl CompactJsonGenerator {
    /// An empty generator
    #[must_use]
    pub fn new() -> Self { Self::default() }

    /// The text written so far
    #[must_use]
    pub fn as_str(&self) -> &str { &self.out }

    /// The complete document; fails when a container is still open
    ///
    /// # Errors
    ///
    /// Returns an error when an object or array is still open or a key has no value.
    pub fn finish(self) -> Result<String> {
        if !self.frames.is_empty() || self.after_key {
            return Err(misuse("document is incomplete"));
        }
        Ok(self.out)
    }

    fn before_value(&mut self) -> Result<()> {
        if self.after_key {
            self.after_key = false;
            return Ok(());
        }
        match self.frames.last_mut() {
            Some(Frame {
                scope: Scope::Array,
                members,
            }) => {
                if *members > 0 {
                    self.out.push(',');
                }
                *members += 1;
                Ok(())
            }
            Some(Frame {
                scope: Scope::Object,
                ..
            }) => Err(misuse("object member without a key")),
            None if self.root_written => Err(misuse("more than one root value")),
            None => {
                self.root_written = true;
                Ok(())
            }
        }
    }

    fn open(&mut self, scope: Scope, token: char) -> Result<()> {
        self.before_value()?;
        self.out.push(token);
        self.frames.push(Frame { scope, members: 0 });
        Ok(())
    }

    fn close(&mut self, scope: Scope, token: char) -> Result<()> {
        if self.after_key {
            return Err(misuse("key without a value"));
        }
        match self.frames.pop() {
            Some(frame) if frame.scope == scope => {
                self.out.push(token);
                Ok(())
            }
            _ => Err(misuse("unbalanced container end")),
        }
    }

    fn push_escaped(&mut self, value: &str) -> Result<()> {
        let escaped = serde_json::to_string(value)
            .map_err(|e| Report::new(Error::Serialization(e.to_string())))?;
        self.out.push_str(&escaped);
        Ok(())
    }
}

impl JsonGenerator for CompactJsonGenerator {
    fn write_start_object(&mut self) -> Result<()> { self.open(Scope::Object, '{') }

    fn write_end_object(&mut self) -> Result<()> { self.close(Scope::Object, '}') }

    fn write_start_array(&mut self) -> Result<()> { self.open(Scope::Array, '[') }

    fn write_end_array(&mut self) -> Result<()> { self.close(Scope::Array, ']') }

    fn write_key(&mut self, key: &str) -> Result<()> {
        if self.after_key {
            return Err(misuse("two keys in a row"));
        }
        let Some(Frame {
            scope: Scope::Object,
            members,
        }) = self.frames.last_mut()
        else {
            return Err(misuse("key outside of an object"));
        };
        if *members > 0 {
            self.out.push(',');
        }
        *members += 1;
        self.push_escaped(key)?;
        self.out.push(':');
        self.after_key = true;
        Ok(())
    }

    fn write_null(&mut self) -> Result<()> {
        self.before_value()?;
        self.out.push_str("null");
        Ok(())
    }

    fn write_bool(&mut self, value: bool) -> Result<()> {
        self.before_value()?;
        self.out.push_str(if value { "true" } else { "false" });
        Ok(())
    }

    fn write_number(&mut self, value: &Number) -> Result<()> {
        self.before_value()?;
        self.out.push_str(&value.to_string());
        Ok(())
    }

    fn write_string(&mut self, value: &str) -> Result<()> {
        self.before_value()?;
        self.push_escaped(value)
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, reason = "test assertions")]
mod tests {
    use super::*;

    #[test]
    fn test_writes_nested_document() {
        let mut generator = CompactJsonGenerator::new();
        generator.write_start_object().expect("start");
        generator.write_key("name").expect("key");
        generator.write_string("a \"quoted\" name").expect("string");
        generator.write_key("tags").expect("key");
        generator.write_start_array().expect("array");
        generator.write_number(&Number::from(1)).expect("number");
        generator.write_null().expect("null");
        generator.write_bool(true).expect("bool");
        generator.write_end_array().expect("end array");
        generator.write_end_object().expect("end object");

        assert_eq!(
            generator.finish().expect("complete document"),
            r#"{"name":"a \"quoted\" name","tags":[1,null,true]}"#
        );
    }

    #[test]
    fn test_rejects_malformed_sequences() {
        let mut generator = CompactJsonGenerator::new();
        generator.write_start_object().expect("start");
        assert!(generator.write_null().is_err());
        assert!(generator.write_end_array().is_err());

        let mut generator = CompactJsonGenerator::new();
        generator.write_start_array().expect("start");
        assert!(generator.write_key("k").is_err());

        let mut generator = CompactJsonGenerator::new();
        generator.write_start_object().expect("start");
        generator.write_key("k").expect("key");
        assert!(generator.finish().is_err());
    }
}

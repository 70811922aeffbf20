//! A textual, line-oriented stream format for run state.
//!
//! The format is a sequence of whitespace-separated tokens grouped
//! into lines; collections are prefixed by their element count. It
//! is written and read by [`Neat::save_state`] and
//! [`Neat::restore_state`], which document the field order.
//! Round-tripping reproduces the logical run state exactly.
//!
//! [`Neat::save_state`]: crate::populations::Neat::save_state
//! [`Neat::restore_state`]: crate::populations::Neat::restore_state

use std::collections::VecDeque;
use std::error::Error;
use std::fmt;
use std::io;
use std::str::FromStr;

/// An error produced while writing or reading a state stream.
///
/// Write failures only wrap I/O errors; read failures additionally
/// cover truncated and malformed input, which are fatal for the
/// enclosing restore operation.
#[derive(Debug)]
pub enum SerializationError {
    Io(io::Error),
    /// The stream ended before the announced state was complete.
    UnexpectedEnd,
    /// A token could not be parsed as the expected field.
    Malformed(String),
}

impl fmt::Display for SerializationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "state stream i/o error: {}", e),
            Self::UnexpectedEnd => write!(f, "state stream ended unexpectedly"),
            Self::Malformed(what) => write!(f, "malformed state stream: {}", what),
        }
    }
}

impl Error for SerializationError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for SerializationError {
    fn from(e: io::Error) -> SerializationError {
        SerializationError::Io(e)
    }
}

/// Token writer over any [`io::Write`].
pub struct Serializer<W: io::Write> {
    writer: W,
}

impl<W: io::Write> Serializer<W> {
    pub fn new(writer: W) -> Serializer<W> {
        Serializer { writer }
    }

    /// Appends one field to the current line.
    pub fn field<T: fmt::Display>(&mut self, value: T) -> Result<(), SerializationError> {
        write!(self.writer, "{} ", value)?;
        Ok(())
    }

    /// Terminates the current line.
    pub fn end_line(&mut self) -> Result<(), SerializationError> {
        writeln!(self.writer)?;
        Ok(())
    }

    /// Flushes and consumes the serializer.
    pub fn finish(mut self) -> Result<(), SerializationError> {
        self.writer.flush()?;
        Ok(())
    }
}

/// Token reader over any [`io::BufRead`].
pub struct Deserializer<R: io::BufRead> {
    reader: R,
    tokens: VecDeque<String>,
}

impl<R: io::BufRead> Deserializer<R> {
    pub fn new(reader: R) -> Deserializer<R> {
        Deserializer {
            reader,
            tokens: VecDeque::new(),
        }
    }

    /// Reads the next field and parses it as `T`.
    pub fn field<T: FromStr>(&mut self) -> Result<T, SerializationError> {
        let token = self.next_token()?;
        token
            .parse()
            .map_err(|_| SerializationError::Malformed(format!("unparsable token {:?}", token)))
    }

    fn next_token(&mut self) -> Result<String, SerializationError> {
        while self.tokens.is_empty() {
            let mut line = String::new();
            if self.reader.read_line(&mut line)? == 0 {
                return Err(SerializationError::UnexpectedEnd);
            }
            self.tokens
                .extend(line.split_whitespace().map(String::from));
        }
        Ok(self.tokens.pop_front().unwrap())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::genomics::{Gene, GeneticConfig, Genome};

    fn round_trip_tokens(write: impl FnOnce(&mut Serializer<&mut Vec<u8>>)) -> Vec<u8> {
        let mut buffer = Vec::new();
        let mut ser = Serializer::new(&mut buffer);
        write(&mut ser);
        buffer
    }

    #[test]
    fn fields_round_trip() {
        let buffer = round_trip_tokens(|ser| {
            ser.field(42usize).unwrap();
            ser.field(-1.5f64).unwrap();
            ser.end_line().unwrap();
            ser.field(true).unwrap();
            ser.field(f64::NEG_INFINITY).unwrap();
            ser.end_line().unwrap();
        });

        let mut des = Deserializer::new(buffer.as_slice());
        assert_eq!(des.field::<usize>().unwrap(), 42);
        assert_eq!(des.field::<f64>().unwrap(), -1.5);
        assert!(des.field::<bool>().unwrap());
        assert_eq!(des.field::<f64>().unwrap(), f64::NEG_INFINITY);
    }

    #[test]
    fn truncated_stream_is_detected() {
        let mut des = Deserializer::new("1 2\n".as_bytes());
        assert_eq!(des.field::<usize>().unwrap(), 1);
        assert_eq!(des.field::<usize>().unwrap(), 2);
        assert!(matches!(
            des.field::<usize>(),
            Err(SerializationError::UnexpectedEnd)
        ));
    }

    #[test]
    fn garbage_token_is_malformed() {
        let mut des = Deserializer::new("woof\n".as_bytes());
        assert!(matches!(
            des.field::<usize>(),
            Err(SerializationError::Malformed(_))
        ));
    }

    #[test]
    fn genome_round_trips_exactly() {
        let mut genome = Genome::new(&GeneticConfig::zero());
        genome.add_gene(Gene::new(0, 1, 2, 0.123456789));
        let mut disabled = Gene::new(5, 2, 2, -3.75);
        disabled.set_enabled(false);
        genome.add_gene(disabled);
        genome.set_fitness(1.25);

        let mut buffer = Vec::new();
        let mut ser = Serializer::new(&mut buffer);
        genome.write_to(&mut ser).unwrap();

        let mut des = Deserializer::new(buffer.as_slice());
        let copy = Genome::read_from(&mut des).unwrap();
        assert_eq!(copy, genome);
    }
}

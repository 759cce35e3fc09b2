//! Register access
//!
//! [`RegisterAccess`] is the word-level interface every consumer of node
//! registers goes through: the feature model while it identifies the node,
//! and configuration objects while they verify and apply settings. It is
//! object safe so it can be handed around as `&mut dyn RegisterAccess`.
//!
//! [`RegisterAccessExt`] layers typed access on top of it:
//!
//! ```ignore
//! use wsn_node::{RegisterAccessExt, SamplingMode};
//!
//! let mode: SamplingMode = access.read_register()?;
//! access.write_register(SamplingMode::NonSync)?;
//! ```

use core::convert::Infallible;

use regiface::{FromByteArray, ReadableRegister, ToByteArray, WritableRegister};

use crate::registers::{decode, encode, word_count};
use crate::{Error, RegisterLocation, Result};

/// Word-level read/write access to a node's registers.
pub trait RegisterAccess {
    /// Reads `count` consecutive words starting at `location`.
    fn read_words(&mut self, location: RegisterLocation, count: usize) -> Result<Vec<u16>>;

    /// Writes consecutive words starting at `location`.
    fn write_words(&mut self, location: RegisterLocation, words: &[u16]) -> Result<()>;
}

/// Typed helpers available on every [`RegisterAccess`].
pub trait RegisterAccessExt: RegisterAccess {
    /// Reads a single word.
    fn read_word(&mut self, location: RegisterLocation) -> Result<u16> {
        self.read_words(location, 1)?
            .first()
            .copied()
            .ok_or_else(|| Error::MalformedResponse(format!("no data at {location:#06x}")))
    }

    /// Writes a single word.
    fn write_word(&mut self, location: RegisterLocation, value: u16) -> Result<()> {
        self.write_words(location, &[value])
    }

    /// Reads a value stored at `location`, spanning as many words as its
    /// byte width requires.
    fn read_value<T: FromByteArray>(&mut self, location: RegisterLocation) -> Result<T> {
        let words = self.read_words(location, word_count::<T>())?;
        decode(location, &words)
    }

    /// Writes a value at `location`.
    fn write_value<T: ToByteArray<Error = Infallible>>(
        &mut self,
        location: RegisterLocation,
        value: T,
    ) -> Result<()> {
        self.write_words(location, &encode(value))
    }

    /// Reads a register at its fixed address.
    ///
    /// # Errors
    /// * `Error::Communication` - the base station could not reach the node
    /// * `Error::MalformedResponse` - the stored value is not a valid `R`
    fn read_register<R>(&mut self) -> Result<R>
    where
        R: ReadableRegister<IdType = u16>,
    {
        self.read_value(R::id())
    }

    /// Writes a register at its fixed address.
    ///
    /// # Errors
    /// * `Error::Communication` - the base station could not reach the node
    fn write_register<R>(&mut self, register: R) -> Result<()>
    where
        R: WritableRegister<IdType = u16, Error = Infallible>,
    {
        self.write_value(R::id(), register)
    }
}

impl<A: RegisterAccess + ?Sized> RegisterAccessExt for A {}

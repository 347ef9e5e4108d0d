//! Arena configuration parameters.

use crate::{
  align::NATURAL_ALIGN,
  error::{AllocError, AllocResult},
};

/// How an arena obtains further blocks once the current one is full.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Growth {
  /// Exactly one block of `block_size`; a miss is exhaustion.
  Disabled,
  /// Every new block is `block_size` bytes.
  Fixed,
  /// Each new block doubles the last regular block, up to `max_block_size`.
  #[default]
  Doubling,
}

/// Configuration for [`Arena`](crate::Arena).
///
/// Validated at construction; immutable afterwards.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ArenaConfig {
  /// Capacity of the first block in bytes.
  pub block_size: usize,
  /// Upper bound for blocks produced by [`Growth::Doubling`].
  ///
  /// Requests larger than the growth target get a dedicated block sized
  /// exactly to the request, regardless of this bound.
  pub max_block_size: usize,
  pub growth: Growth,
  /// Alignment every allocation is rounded up to. Must be a power of two.
  pub alignment: usize,
}

impl ArenaConfig {
  /// Default first block: 64 KiB.
  pub const DEFAULT_BLOCK_SIZE: usize = 64 * 1024;

  /// Default doubling cap: 16 MiB.
  pub const DEFAULT_MAX_BLOCK_SIZE: usize = 16 * 1024 * 1024;

  pub fn new(
    block_size: usize,
  ) -> Self {
    Self {
      block_size,
      max_block_size: Self::DEFAULT_MAX_BLOCK_SIZE.max(block_size),
      growth: Growth::default(),
      alignment: NATURAL_ALIGN,
    }
  }

  pub fn with_block_size(
    mut self,
    block_size: usize,
  ) -> Self {
    self.block_size = block_size;
    self.max_block_size = self.max_block_size.max(block_size);
    self
  }

  pub fn with_max_block_size(
    mut self,
    max_block_size: usize,
  ) -> Self {
    self.max_block_size = max_block_size;
    self
  }

  pub fn with_growth(
    mut self,
    growth: Growth,
  ) -> Self {
    self.growth = growth;
    self
  }

  pub fn with_alignment(
    mut self,
    alignment: usize,
  ) -> Self {
    self.alignment = alignment;
    self
  }

  pub fn validate(
    &self,
  ) -> AllocResult<()> {
    if self.block_size == 0 {
      return Err(AllocError::invalid_config("block size must be non-zero"));
    }
    if !self.alignment.is_power_of_two() {
      return Err(AllocError::invalid_config("alignment must be a power of two"));
    }
    if self.max_block_size < self.block_size {
      return Err(AllocError::invalid_config(
        "max block size must not be smaller than block size",
      ));
    }
    Ok(())
  }

  /// Capacity of the block that follows a regular block of `last` bytes.
  ///
  /// `None` when no further block may be created.
  pub fn next_block_size(
    &self,
    last: Option<usize>,
  ) -> Option<usize> {
    match (self.growth, last) {
      (_, None) => Some(self.block_size),
      (Growth::Disabled, Some(_)) => None,
      (Growth::Fixed, Some(_)) => Some(self.block_size),
      (Growth::Doubling, Some(last)) => Some(
        last
          .saturating_mul(2)
          .min(self.max_block_size)
          .max(self.block_size),
      ),
    }
  }
}

impl Default for ArenaConfig {
  fn default() -> Self {
    Self::new(Self::DEFAULT_BLOCK_SIZE)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_default_is_valid() {
    let config = ArenaConfig::default();
    assert_eq!(config.block_size, 64 * 1024);
    assert_eq!(config.growth, Growth::Doubling);
    assert_eq!(config.alignment, NATURAL_ALIGN);
    assert!(config.validate().is_ok());
  }

  #[test]
  fn test_validate_rejects_bad_values() {
    assert!(ArenaConfig::new(0).validate().is_err());
    assert!(ArenaConfig::new(64).with_alignment(12).validate().is_err());
    assert!(ArenaConfig::new(64).with_max_block_size(32).validate().is_err());
  }

  #[test]
  fn test_block_size_raises_cap() {
    let config = ArenaConfig::default().with_block_size(32 * 1024 * 1024);
    assert_eq!(config.max_block_size, 32 * 1024 * 1024);
    assert!(config.validate().is_ok());
  }

  #[test]
  fn test_next_block_size() {
    let doubling = ArenaConfig::new(64).with_max_block_size(256);
    assert_eq!(doubling.next_block_size(None), Some(64));
    assert_eq!(doubling.next_block_size(Some(64)), Some(128));
    assert_eq!(doubling.next_block_size(Some(128)), Some(256));
    assert_eq!(doubling.next_block_size(Some(256)), Some(256));

    let fixed = ArenaConfig::new(64).with_growth(Growth::Fixed);
    assert_eq!(fixed.next_block_size(Some(64)), Some(64));

    let disabled = ArenaConfig::new(64).with_growth(Growth::Disabled);
    assert_eq!(disabled.next_block_size(None), Some(64));
    assert_eq!(disabled.next_block_size(Some(64)), None);
  }
}

//! Conversion between typed values and the vault's string representation.

use crate::error::{VaultError, VaultResult};

/// A type that can be tokenized and recovered from a detokenized string.
pub trait VaultValue: Sized {
    /// Type name used in conversion errors.
    const TYPE_NAME: &'static str;

    /// String sent to the vault.
    fn to_vault_string(&self) -> String;

    /// Parse a detokenized string.
    ///
    /// # Errors
    ///
    /// Returns `Conversion` if `raw` does not parse as `Self`.
    fn from_vault_string(raw: &str) -> VaultResult<Self>;
}

impl VaultValue for String {
    const TYPE_NAME: &'static str = "string";

    fn to_vault_string(&self) -> String {
        self.clone()
    }

    fn from_vault_string(raw: &str) -> VaultResult<Self> {
        Ok(raw.to_string())
    }
}

macro_rules! parsed_vault_value {
    ($($ty:ty => $name:literal),* $(,)?) => {
        $(
            impl VaultValue for $ty {
                const TYPE_NAME: &'static str = $name;

                fn to_vault_string(&self) -> String {
                    self.to_string()
                }

                fn from_vault_string(raw: &str) -> VaultResult<Self> {
                    raw.trim().parse().map_err(|_| VaultError::Conversion {
                        value_type: Self::TYPE_NAME,
                        value: raw.to_string(),
                    })
                }
            }
        )*
    };
}

parsed_vault_value! {
    i32 => "int",
    i64 => "long",
    f32 => "float",
    f64 => "double",
    bool => "boolean",
}

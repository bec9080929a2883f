//! Request/response encryption and the plain/encrypted transport strategy.

mod encryptor;
mod strategy;

pub use encryptor::{AesGcmEncryptor, DisabledEncryptor, PayloadEncryptor};
pub use strategy::{
    ApiResponse, BACKEND_DECRYPTION_UNAVAILABLE, EncryptedTransport, EncryptionStrategy,
    PlainTransport, RemoteCall,
};

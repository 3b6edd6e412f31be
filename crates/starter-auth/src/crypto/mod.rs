// Crypto primitives: scrypt password hashing and random token generation.

pub mod password;
pub mod random;

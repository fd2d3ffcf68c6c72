pub mod ecdsa;
pub mod secp256k1;

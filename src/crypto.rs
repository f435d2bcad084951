//! Cryptographic building blocks: backends, key-share engines, cipher suites and the
//! TLS 1.3 key schedule.
//!
//! 密码学构件：后端、密钥共享引擎、密码套件以及 TLS 1.3 密钥调度。

pub mod backend;
pub mod capabilities;
pub mod engine;
pub mod keys;
pub mod suite;

// Exchange API clients

pub mod upbit;

pub use upbit::UpbitClient;

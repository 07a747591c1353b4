//! Exchange adapter support: HTTP plumbing with non-fatal error
//! classification, fee overrides, and the paper (simulated) exchange.

mod fees;
mod network;
mod paper;

pub use fees::{FeeOverrides, BUY_FEE_KEY, SELL_FEE_KEY};
pub use network::{classify_status, classify_transport, ExchangeHttpClient};
pub use paper::{PaperExchangeAdapter, PAPER_ADAPTER_ID};

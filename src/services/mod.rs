//! HTTP clients for the third-party APIs actions call.

pub mod coingecko;
pub mod defillama;
pub mod fourmeme;

pub use coingecko::CoingeckoClient;
pub use defillama::{DefiLlamaClient, ProtocolTvl};
pub use fourmeme::FourMemeClient;

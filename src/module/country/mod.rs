pub mod fetcher;
pub mod reconciler;
pub mod store;
pub mod types;
pub mod updater;

pub use fetcher::CountryFetcher;
pub use reconciler::{MultiplierSource, UniformMultiplier};
pub use store::CountryStore;
pub use types::{Country, ImageData, NewCountry, RawCountry, StatusSummary};
pub use updater::RefreshService;

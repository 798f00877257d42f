pub mod browser_fetcher;

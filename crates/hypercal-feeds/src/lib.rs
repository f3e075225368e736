//! Feed access for hypercal.
//!
//! This crate provides:
//! - [`HttpFeedFetcher`]: the HTTP implementation of
//!   [`hypercal_core::FeedFetcher`], with its URL policy
//! - [`parse_feed`] and [`render_calendar`]: iCalendar text in and out

pub mod fetcher;
pub mod ics;

pub use fetcher::{FetcherConfig, HttpFeedFetcher};
pub use ics::{parse_feed, render_calendar};

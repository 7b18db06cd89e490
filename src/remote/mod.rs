//! Hosted daily log store.
//!
//! Talks to the `daily_logs` table through its PostgREST endpoint:
//!
//! - range read: `GET /rest/v1/daily_logs?user_id=eq.{user}&date=gte.{start}&date=lte.{end}`
//! - upsert: `POST /rest/v1/daily_logs?on_conflict=user_id,date` with
//!   `Prefer: resolution=merge-duplicates,return=representation`

mod client;

pub use client::RemoteStore;

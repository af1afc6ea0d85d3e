pub mod airtable;
pub mod simulated;
pub mod supabase;

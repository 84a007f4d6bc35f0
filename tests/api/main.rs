mod entry_point;
mod helpers;
mod postgres_store;
mod startup;

pub mod earthquake;

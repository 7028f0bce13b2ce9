//!  Storage is organized through [record_storage::FileLedgerStorage].
//!  The basic idea is:
//!   - There is a directory with all the records.
//!   - Every local calendar day gets its own record file under `YYYY/M/D`.
//!   - A record holds one `HH:MM,task,DIRECTION` line per action, in the order they happened.
//!   - A record is always rewritten as a whole, never patched in place.

pub mod record_storage;

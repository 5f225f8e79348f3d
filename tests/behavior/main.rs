// Behavior tests shared by every service
// `memory` always runs, the rest need OPENDAL_<SCHEME>_TEST=on (see .env.example)

mod blocking;
mod list;
mod read;
mod utils;
mod write;

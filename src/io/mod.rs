// External I/O operations module
pub mod dbus; // logind sleep/resume monitoring
pub mod signals; // Unix signal handling and the run loop channel
pub mod stdin; // Host command transport

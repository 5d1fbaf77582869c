// Resource endpoint modules
//
// Thin validate-and-dispatch wrappers over the request executor, one file
// per resource family. All methods return unwrapped `data` payloads --
// the envelope is stripped before the caller sees it.

mod clients;
mod devices;
mod events;
mod sites;
mod system;

// src/routes/mod.rs
// One module per upstream provider. Every route follows the same shape:
// fetch raw payload -> filter -> normalize/map -> assemble a FeedEnvelope.
// The mapping step is a pure function over the parsed payload so tests can
// feed fixtures without touching the network.

pub mod cls;
pub mod eastmoney;
pub mod jin10;
pub mod kaipanla;
pub mod sina;
pub mod tencent;
pub mod wallstreetcn;

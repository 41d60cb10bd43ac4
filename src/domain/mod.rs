// Domain layer: the stored-item model and the ports (storage capability set, HTTP transport).

pub mod model;
pub mod ports;

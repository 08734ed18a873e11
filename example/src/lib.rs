//! Types generated from `schema/*.colf` by the build script. Every module
//! mirrors a schema package, so cross-package references resolve as
//! `crate::<package path>`.

pub mod demo {
    include!(concat!(env!("OUT_DIR"), "/demo/Shape.rs"));

    pub mod ext {
        include!(concat!(env!("OUT_DIR"), "/demo/ext/Mark.rs"));
    }
}

pub mod tight {
    include!(concat!(env!("OUT_DIR"), "/tight/Frame.rs"));
}

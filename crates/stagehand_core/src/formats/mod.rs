//! Built-in importers and exporters.
//!
//! | id        | import | export                    |
//! |-----------|--------|---------------------------|
//! | `obj`     | yes    | `.obj` + `.mtl`           |
//! | `gltf2`   | yes    | `.gltf` + `.bin`          |
//! | `glb2`    | (gltf2)| `.glb`                    |
//! | `stl`     | yes    | `.stl` (ASCII)            |
//! | `off`     | yes    | no                        |
//! | `assjson` | no     | `.json`                   |

pub mod assjson;
pub mod gltf_reader;
pub mod gltf_writer;
pub mod obj;
pub mod off;
pub mod stl;

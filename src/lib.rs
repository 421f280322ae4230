//! Visualize recombination events from a variant table.
//!
//! A variant table is a whitespace-delimited text file (optionally
//! gzip-compressed) with a header line whose second field is `POS`. Its last
//! three columns hold integer genotype codes for three samples, typically a
//! donor, an acceptor and a recombinant. [`RecombTracks`] collects, for each of
//! the three samples, the positions where that sample carries a positive code,
//! and [`RecombPlot`] draws those tracks together with the four candidate
//! breakpoints.
//!
//! ```no_run
//! use recplot::prelude::*;
//! let tracks = RecombTracks::from_path("recombinant.vcf", Some("node_1234"))
//!                  .expect("cannot read variant table");
//!
//! let plot = RecombPlot::new(29903, Breakpoints::new(11000, 11300, 21500, 21800));
//! plot.render(&tracks, "recombinant.svg").expect("cannot render plot");
//! ```
//!
//! Lines whose three genotype codes are all equal are skipped entirely, even
//! when the codes are positive.

pub mod file;
pub mod plot;
pub mod tracks;

pub use plot::{Breakpoints, ImageFormat, RecombPlot};
pub use tracks::{Header, Position, RecPlotError, RecombTracks, Track};

pub mod prelude {
    pub use crate::plot::{Breakpoints, ImageFormat, RecombPlot};
    pub use crate::tracks::{Position, RecPlotError, RecombTracks, Track};
}

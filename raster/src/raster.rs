//! Georeferenced multi-band rasters.
//!
//! Samples are `f64` and stored band major: the sample at column `x`,
//! row `y`, band `z` lives at `z * (xsize * ysize) + y * xsize + x`.
//! This is the iteration order of [Box3D], so any row band of the
//! raster's cell box is one contiguous run of samples.

use crate::RasterError;
use byteorder::{BigEndian as BE, ReadBytesExt, WriteBytesExt};
use coordsys::CoordinateSystem;
use grid::{Box3D, Envelope, GeoReference, GridError, Size, Voxel};
use log::debug;
use memmap2::Mmap;
use serde::{Deserialize, Serialize};
use std::{
    fs::File,
    io::{BufReader, BufWriter, Write},
    mem::size_of,
    path::Path,
    sync::Arc,
};

/// Sentinel for an undefined sample.
pub const UNDEF: f64 = -1e308;

/// Returns true if `v` is the undefined sentinel or not a number.
pub fn is_undef(v: f64) -> bool {
    v == UNDEF || v.is_nan()
}

/// What the samples of a raster mean.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Domain {
    /// Arbitrary real numbers.
    #[default]
    Value,
    /// Integers in `0..=255`.
    Image,
    /// `0` or `1`.
    Bool,
}

impl Domain {
    /// Maps a computed value onto this domain. Undefined stays
    /// undefined.
    pub fn normalize(self, v: f64) -> f64 {
        if is_undef(v) {
            return UNDEF;
        }
        match self {
            Self::Value => v,
            Self::Image => v.round().clamp(0.0, 255.0),
            Self::Bool => {
                if v != 0.0 {
                    1.0
                } else {
                    0.0
                }
            }
        }
    }
}

/// How to load samples from disk.
///
/// Mapped rasters are read only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SampleMode {
    /// Read samples into memory.
    #[default]
    InMem,
    /// Memory map the sample file.
    MemMap,
}

enum SampleStore {
    InMem(Box<[f64]>),
    MemMap(Mmap),
}

impl SampleStore {
    fn len(&self) -> usize {
        match self {
            Self::InMem(samples) => samples.len(),
            Self::MemMap(raw) => raw.len() / size_of::<f64>(),
        }
    }

    fn get(&self, index: usize) -> f64 {
        match self {
            Self::InMem(samples) => samples.get(index).copied().unwrap_or(UNDEF),
            Self::MemMap(raw) => {
                let start = index * size_of::<f64>();
                raw.get(start..start + size_of::<f64>())
                    .and_then(|mut bytes| bytes.read_f64::<BE>().ok())
                    .unwrap_or(UNDEF)
            }
        }
    }
}

pub struct Raster {
    name: String,
    georef: Arc<GeoReference>,
    /// Always the georeference's coordinate system.
    csy: Arc<CoordinateSystem>,
    domain: Domain,
    cells: Box3D<i64>,
    samples: SampleStore,
}

impl std::fmt::Debug for Raster {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Raster")
            .field("name", &self.name)
            .field("georef", &self.georef.name())
            .field("domain", &self.domain)
            .field("size", &self.size())
            .finish()
    }
}

impl Raster {
    /// Returns an in-memory raster with every sample undefined.
    pub fn new(
        name: impl Into<String>,
        georef: Arc<GeoReference>,
        domain: Domain,
        bands: usize,
    ) -> Result<Self, RasterError> {
        let name = name.into();
        let cells = cells(&name, &georef, bands)?;
        let samples = vec![UNDEF; cells.volume()].into_boxed_slice();
        Ok(Self::assemble(name, georef, domain, cells, SampleStore::InMem(samples)))
    }

    /// Returns an in-memory raster holding `samples`.
    pub fn from_samples(
        name: impl Into<String>,
        georef: Arc<GeoReference>,
        domain: Domain,
        bands: usize,
        samples: Vec<f64>,
    ) -> Result<Self, RasterError> {
        let name = name.into();
        let cells = cells(&name, &georef, bands)?;
        check_len(&name, cells.volume(), samples.len())?;
        let samples = SampleStore::InMem(samples.into_boxed_slice());
        Ok(Self::assemble(name, georef, domain, cells, samples))
    }

    /// Reads big-endian `f64` samples from the file at `path`.
    pub fn load<P: AsRef<Path>>(
        path: P,
        name: impl Into<String>,
        georef: Arc<GeoReference>,
        domain: Domain,
        bands: usize,
    ) -> Result<Self, RasterError> {
        let name = name.into();
        let cells = cells(&name, &georef, bands)?;
        let expected = cells.volume();
        let file_len = path.as_ref().metadata()?.len() as usize;
        check_len(&name, expected, file_len / size_of::<f64>())?;
        debug!("loading {:?}", path.as_ref());

        let mut file = BufReader::new(File::open(path)?);
        let mut samples = Vec::with_capacity(expected);
        for _ in 0..expected {
            samples.push(file.read_f64::<BE>()?);
        }
        let samples = SampleStore::InMem(samples.into_boxed_slice());
        Ok(Self::assemble(name, georef, domain, cells, samples))
    }

    /// Uses the memory-mapped file at `path` as read-only storage.
    pub fn memmap<P: AsRef<Path>>(
        path: P,
        name: impl Into<String>,
        georef: Arc<GeoReference>,
        domain: Domain,
        bands: usize,
    ) -> Result<Self, RasterError> {
        let name = name.into();
        let cells = cells(&name, &georef, bands)?;
        debug!("mapping {:?}", path.as_ref());
        let samples = {
            let file = File::open(path)?;
            let mmap = unsafe { Mmap::map(&file)? };
            SampleStore::MemMap(mmap)
        };
        check_len(&name, cells.volume(), samples.len())?;
        Ok(Self::assemble(name, georef, domain, cells, samples))
    }

    fn assemble(
        name: String,
        georef: Arc<GeoReference>,
        domain: Domain,
        cells: Box3D<i64>,
        samples: SampleStore,
    ) -> Self {
        let csy = Arc::clone(georef.coordinate_system());
        Self {
            name,
            georef,
            csy,
            domain,
            cells,
            samples,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn georeference(&self) -> &Arc<GeoReference> {
        &self.georef
    }

    pub fn coordinate_system(&self) -> &Arc<CoordinateSystem> {
        &self.csy
    }

    pub fn domain(&self) -> Domain {
        self.domain
    }

    pub fn size(&self) -> Size {
        Size::new(
            self.cells.xlength(),
            self.cells.ylength(),
            self.cells.zlength(),
        )
    }

    /// Box of every cell position.
    pub fn cells(&self) -> Box3D<i64> {
        self.cells
    }

    /// Area covered by the outer corners of the grid.
    pub fn envelope(&self) -> Envelope {
        self.georef
            .pixel_envelope()
            .unwrap_or_else(Envelope::invalid)
    }

    /// Returns true if samples can be modified in place.
    pub fn is_writable(&self) -> bool {
        matches!(self.samples, SampleStore::InMem(_))
    }

    /// Sample at `v`, or [UNDEF] outside the raster.
    pub fn value(&self, v: Voxel<i64>) -> f64 {
        self.cells
            .linear_index(v)
            .map_or(UNDEF, |index| self.samples.get(index))
    }

    /// Mutable band-major samples of an in-memory raster.
    pub fn samples_mut(&mut self) -> Result<&mut [f64], RasterError> {
        match &mut self.samples {
            SampleStore::InMem(samples) => Ok(&mut samples[..]),
            SampleStore::MemMap(_) => Err(RasterError::ReadOnly(self.name.clone())),
        }
    }

    /// Returns an iterator over every sample in band-major order.
    pub fn iter(&self) -> impl Iterator<Item = f64> + '_ {
        (0..self.cells.volume()).map(|index| self.samples.get(index))
    }

    /// Lowest and highest defined sample, if any.
    pub fn min_max(&self) -> Option<(f64, f64)> {
        self.iter()
            .filter(|v| !is_undef(*v))
            .fold(None, |acc, v| match acc {
                None => Some((v, v)),
                Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
            })
    }

    /// Writes every sample as big-endian `f64` to `path`.
    pub fn write<P: AsRef<Path>>(&self, path: P) -> Result<(), RasterError> {
        debug!("writing {} to {:?}", self.name, path.as_ref());
        let mut file = BufWriter::new(File::create(path)?);
        for v in self.iter() {
            file.write_f64::<BE>(v)?;
        }
        file.flush()?;
        Ok(())
    }
}

/// Cell box for `bands` bands over `georef`, which must be computed.
fn cells(name: &str, georef: &GeoReference, bands: usize) -> Result<Box3D<i64>, RasterError> {
    if !georef.is_computed() {
        return Err(GridError::NotComputed(georef.name().to_owned()).into());
    }
    let size = georef.size().with_bands(bands);
    if size.is_null() {
        return Err(GridError::NullSize(name.to_owned()).into());
    }
    Box3D::from_size(size).ok_or_else(|| RasterError::TooLarge(name.to_owned()))
}

fn check_len(name: &str, expected: usize, found: usize) -> Result<(), RasterError> {
    if expected == found {
        Ok(())
    } else {
        Err(RasterError::SampleLen {
            name: name.to_owned(),
            expected,
            found,
        })
    }
}

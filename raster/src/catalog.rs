//! Name resolution for rasters, georeferences and coordinate systems.

use crate::{
    definition::{CsyDef, Definition, GeorefDef, RasterDef},
    Raster, RasterError, SampleMode,
};
use coordsys::CoordinateSystem;
use dashmap::DashMap;
use grid::GeoReference;
use log::debug;
use std::{
    fs::File,
    io::{BufReader, BufWriter, ErrorKind},
    path::{Path, PathBuf},
    sync::Arc,
};

/// Looks up named objects.
pub trait Resolver: Send + Sync {
    fn raster(&self, name: &str) -> Result<Arc<Raster>, RasterError>;

    fn georeference(&self, name: &str) -> Result<Arc<GeoReference>, RasterError>;

    fn coordinate_system(&self, name: &str) -> Result<Arc<CoordinateSystem>, RasterError>;
}

/// A [Resolver] over a directory of definitions.
///
/// Objects are loaded on first use from `<dir>/<name>.json` and kept
/// for the life of the catalog. Raster samples come from
/// `<dir>/<name>.bin` unless the definition names another file.
/// Objects can also be inserted directly, with or without a directory.
///
/// The coordinate systems `wgs84`, `unknown` and `utm<zone><n|s>`
/// (e.g. `utm31n`) are always available.
pub struct Catalog {
    dir: Option<PathBuf>,

    /// How to load raster samples (in-memory or mapped).
    mode: SampleMode,

    csys: DashMap<String, Arc<CoordinateSystem>>,
    georefs: DashMap<String, Arc<GeoReference>>,
    rasters: DashMap<String, Arc<Raster>>,
}

impl Catalog {
    /// Returns a catalog backed by `dir`, which must be a readable
    /// directory.
    pub fn open(dir: PathBuf, mode: SampleMode) -> Result<Self, RasterError> {
        // Fail early on a missing or unreadable directory.
        std::fs::read_dir(&dir)?;
        Ok(Self {
            dir: Some(dir),
            ..Self::in_memory(mode)
        })
    }

    /// Returns a catalog holding only inserted objects.
    pub fn in_memory(mode: SampleMode) -> Self {
        Self {
            dir: None,
            mode,
            csys: DashMap::new(),
            georefs: DashMap::new(),
            rasters: DashMap::new(),
        }
    }

    pub fn dir(&self) -> Option<&Path> {
        self.dir.as_deref()
    }

    pub fn insert_coordinate_system(&self, csy: CoordinateSystem) -> Arc<CoordinateSystem> {
        let csy = Arc::new(csy);
        self.csys.insert(csy.name().to_owned(), Arc::clone(&csy));
        csy
    }

    pub fn insert_georeference(&self, georef: GeoReference) -> Arc<GeoReference> {
        let georef = Arc::new(georef);
        self.georefs
            .insert(georef.name().to_owned(), Arc::clone(&georef));
        georef
    }

    pub fn insert_raster(&self, raster: Raster) -> Arc<Raster> {
        let raster = Arc::new(raster);
        self.rasters.insert(raster.name().to_owned(), Arc::clone(&raster));
        raster
    }

    /// Writes `raster` to the catalog directory and inserts it.
    ///
    /// The raster's georeference and coordinate system are written as
    /// well unless they are builtin or already defined.
    pub fn store(&self, raster: Raster) -> Result<Arc<Raster>, RasterError> {
        let dir = self.dir.as_ref().ok_or(RasterError::NoDirectory)?;
        let georef = raster.georeference();
        let csy = georef.coordinate_system();

        if builtin(csy.name()).is_none() && !self.has_definition(csy.name()) {
            self.write_definition(
                csy.name(),
                &Definition::CoordinateSystem(CsyDef::from_csy(csy)),
            )?;
        }
        if !self.has_definition(georef.name()) {
            self.write_definition(
                georef.name(),
                &Definition::GeoReference(GeorefDef::from_georef(georef)),
            )?;
        }
        let def = RasterDef {
            georef: georef.name().to_owned(),
            domain: raster.domain(),
            bands: raster.size().zsize,
            data: None,
        };
        self.write_definition(raster.name(), &Definition::Raster(def))?;
        raster.write(dir.join(format!("{}.bin", raster.name())))?;

        Ok(self.insert_raster(raster))
    }
}

impl Resolver for Catalog {
    fn raster(&self, name: &str) -> Result<Arc<Raster>, RasterError> {
        self.rasters
            .entry(name.to_owned())
            .or_try_insert_with(|| self.load_raster(name).map(Arc::new))
            .map(|r| r.clone())
    }

    fn georeference(&self, name: &str) -> Result<Arc<GeoReference>, RasterError> {
        self.georefs
            .entry(name.to_owned())
            .or_try_insert_with(|| self.load_georeference(name).map(Arc::new))
            .map(|r| r.clone())
    }

    fn coordinate_system(&self, name: &str) -> Result<Arc<CoordinateSystem>, RasterError> {
        self.csys
            .entry(name.to_owned())
            .or_try_insert_with(|| match builtin(name) {
                Some(csy) => csy.map(Arc::new),
                None => self.load_coordinate_system(name).map(Arc::new),
            })
            .map(|r| r.clone())
    }
}

/// Private API.
impl Catalog {
    fn definition_path(&self, name: &str) -> Option<PathBuf> {
        self.dir
            .as_ref()
            .map(|dir| dir.join(format!("{name}.json")))
    }

    fn has_definition(&self, name: &str) -> bool {
        self.definition_path(name).map_or(false, |path| path.exists())
    }

    fn read_definition(&self, name: &str) -> Result<Definition, RasterError> {
        let path = self
            .definition_path(name)
            .ok_or_else(|| RasterError::NotFound(name.to_owned()))?;
        debug!("reading {path:?}");
        let file = match File::open(&path) {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(RasterError::NotFound(name.to_owned()))
            }
            Err(e) => return Err(e.into()),
        };
        Ok(serde_json::from_reader(BufReader::new(file))?)
    }

    fn write_definition(&self, name: &str, def: &Definition) -> Result<(), RasterError> {
        let path = self.definition_path(name).ok_or(RasterError::NoDirectory)?;
        debug!("writing {path:?}");
        let file = BufWriter::new(File::create(path)?);
        serde_json::to_writer_pretty(file, def)?;
        Ok(())
    }

    fn load_coordinate_system(&self, name: &str) -> Result<CoordinateSystem, RasterError> {
        match self.read_definition(name)? {
            Definition::CoordinateSystem(def) => def.build(name),
            other => Err(wrong_kind(name, "coordinate system", &other)),
        }
    }

    fn load_georeference(&self, name: &str) -> Result<GeoReference, RasterError> {
        match self.read_definition(name)? {
            Definition::GeoReference(def) => {
                let csy = self.coordinate_system(&def.csy)?;
                def.build(name, csy)
            }
            other => Err(wrong_kind(name, "georeference", &other)),
        }
    }

    fn load_raster(&self, name: &str) -> Result<Raster, RasterError> {
        let def = match self.read_definition(name)? {
            Definition::Raster(def) => def,
            other => return Err(wrong_kind(name, "raster", &other)),
        };
        let georef = self.georeference(&def.georef)?;
        let dir = self.dir.as_ref().ok_or(RasterError::NoDirectory)?;
        let path = dir.join(def.data.unwrap_or_else(|| format!("{name}.bin")));
        match self.mode {
            SampleMode::InMem => Raster::load(path, name, georef, def.domain, def.bands),
            SampleMode::MemMap => Raster::memmap(path, name, georef, def.domain, def.bands),
        }
    }
}

fn wrong_kind(name: &str, expected: &'static str, found: &Definition) -> RasterError {
    RasterError::WrongKind {
        name: name.to_owned(),
        expected,
        found: found.kind(),
    }
}

/// Coordinate systems every catalog knows.
fn builtin(name: &str) -> Option<Result<CoordinateSystem, RasterError>> {
    let lower = name.to_lowercase();
    match lower.as_str() {
        "wgs84" => return Some(Ok(CoordinateSystem::wgs84())),
        "unknown" => return Some(Ok(CoordinateSystem::unknown())),
        _ => (),
    }
    let rest = lower.strip_prefix("utm")?;
    let (zone, north) = match rest.strip_suffix('n') {
        Some(zone) => (zone, true),
        None => (rest.strip_suffix('s')?, false),
    };
    let zone = zone.parse::<u8>().ok()?;
    Some(CoordinateSystem::utm(zone, north).map_err(RasterError::from))
}

#[cfg(test)]
mod tests {
    use super::{Catalog, Resolver};
    use crate::{raster::tests::raster_from_fn, Domain, Raster, RasterError, SampleMode};
    use grid::Size;
    use std::{path::PathBuf, sync::Arc};
    use tempfile::tempdir;

    fn write(dir: &std::path::Path, file: &str, contents: &str) {
        std::fs::write(dir.join(file), contents).unwrap();
    }

    #[test]
    fn test_builtin_coordinate_systems() {
        let catalog = Catalog::in_memory(SampleMode::InMem);
        assert!(catalog.coordinate_system("wgs84").unwrap().is_latlon());
        let utm = catalog.coordinate_system("UTM31N").unwrap();
        assert_eq!(utm.name(), "utm31n");
        assert!(catalog.coordinate_system("utm61n").is_err());
        assert!(matches!(
            catalog.coordinate_system("utm31x"),
            Err(RasterError::NotFound(_))
        ));
    }

    #[test]
    fn test_open_missing_dir() {
        assert!(Catalog::open(PathBuf::from("/nonexistent/catalog"), SampleMode::InMem).is_err());
    }

    #[test]
    fn test_lazy_load_and_cache() {
        let temp_dir = tempdir().unwrap();
        let dir = temp_dir.path().to_path_buf();
        write(
            &dir,
            "grid.json",
            r#"{ "type": "georeference", "csy": "unknown",
                 "size": { "xsize": 3, "ysize": 2 },
                 "envelope": { "min": { "x": 0, "y": 0 }, "max": { "x": 3, "y": 2 } } }"#,
        );
        write(
            &dir,
            "dem.json",
            r#"{ "type": "raster", "georef": "grid" }"#,
        );
        raster_from_fn(3, 2, |x, y| (x + 10 * y) as f64)
            .write(dir.join("dem.bin"))
            .unwrap();

        for mode in [SampleMode::InMem, SampleMode::MemMap] {
            let catalog = Catalog::open(dir.clone(), mode).unwrap();
            let dem = catalog.raster("dem").unwrap();
            assert_eq!(dem.size(), Size::new(3, 2, 1));
            assert_eq!(
                dem.iter().collect::<Vec<_>>(),
                vec![0.0, 1.0, 2.0, 10.0, 11.0, 12.0]
            );
            assert!(Arc::ptr_eq(&dem, &catalog.raster("dem").unwrap()));
            assert!(Arc::ptr_eq(
                dem.georeference(),
                &catalog.georeference("grid").unwrap()
            ));
        }
    }

    #[test]
    fn test_missing_and_wrong_kind() {
        let temp_dir = tempdir().unwrap();
        let dir = temp_dir.path().to_path_buf();
        write(&dir, "r.json", r#"{ "type": "raster", "georef": "nowhere" }"#);
        let catalog = Catalog::open(dir.clone(), SampleMode::InMem).unwrap();
        assert!(matches!(catalog.raster("absent"), Err(RasterError::NotFound(_))));
        assert!(matches!(catalog.raster("r"), Err(RasterError::NotFound(n)) if n == "nowhere"));
        assert!(matches!(
            catalog.georeference("r"),
            Err(RasterError::WrongKind { .. })
        ));
    }

    #[test]
    fn test_store_then_reopen() {
        let temp_dir = tempdir().unwrap();
        let dir = temp_dir.path().to_path_buf();
        let catalog = Catalog::open(dir.clone(), SampleMode::InMem).unwrap();
        let raster = raster_from_fn(4, 4, |x, y| (x * y) as f64);
        let expected: Vec<f64> = raster.iter().collect();
        let stored = catalog.store(raster).unwrap();
        assert!(Arc::ptr_eq(&stored, &catalog.raster("test").unwrap()));

        let reopened = Catalog::open(dir.clone(), SampleMode::MemMap).unwrap();
        let loaded = reopened.raster("test").unwrap();
        assert_eq!(loaded.iter().collect::<Vec<_>>(), expected);
        assert_eq!(loaded.domain(), Domain::Value);
        assert!(loaded
            .georeference()
            .is_compatible(stored.georeference()));
    }

    #[test]
    fn test_store_needs_directory() {
        let catalog = Catalog::in_memory(SampleMode::InMem);
        let raster = raster_from_fn(2, 2, |_, _| 1.0);
        assert!(matches!(catalog.store(raster), Err(RasterError::NoDirectory)));
        let inserted: Arc<Raster> = catalog.insert_raster(raster_from_fn(2, 2, |_, _| 1.0));
        assert!(Arc::ptr_eq(&inserted, &catalog.raster("test").unwrap()));
    }
}

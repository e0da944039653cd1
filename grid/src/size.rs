use serde::{Deserialize, Serialize};

/// Raster dimensions: columns, rows and bands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Size {
    pub xsize: usize,
    pub ysize: usize,
    #[serde(default = "one")]
    pub zsize: usize,
}

fn one() -> usize {
    1
}

impl Size {
    pub fn new(xsize: usize, ysize: usize, zsize: usize) -> Self {
        Self {
            xsize,
            ysize,
            zsize,
        }
    }

    /// A single band size.
    pub fn plane(xsize: usize, ysize: usize) -> Self {
        Self::new(xsize, ysize, 1)
    }

    /// True if any dimension is zero.
    pub fn is_null(&self) -> bool {
        self.xsize == 0 || self.ysize == 0 || self.zsize == 0
    }

    /// Number of cells.
    pub fn linear_size(&self) -> usize {
        self.xsize * self.ysize * self.zsize
    }

    /// Same columns and rows with `zsize` bands.
    pub fn with_bands(self, zsize: usize) -> Self {
        Self { zsize, ..self }
    }
}

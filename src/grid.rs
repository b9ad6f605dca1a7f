use ndarray::{Array1, Array2};

// Builds the 2D sample grids for a pair of axes, numpy `meshgrid` style:
// `x` varies along columns, `y` along rows.
pub fn meshgrid(x_axis: &Array1<f64>, y_axis: &Array1<f64>) -> (Array2<f64>, Array2<f64>) {
    let shape = (y_axis.len(), x_axis.len());
    let x = Array2::from_shape_fn(shape, |(_, j)| x_axis[j]);
    let y = Array2::from_shape_fn(shape, |(i, _)| y_axis[i]);
    (x, y)
}

// Square sampling of the aperture plane, centred on the optical axis.
#[derive(Clone, Debug)]
pub struct CoordinateGrid {
    pub x: Array2<f64>,
    pub y: Array2<f64>,
}

impl CoordinateGrid {
    // `samples` points spanning [-extent/2, extent/2] on both axes, endpoints included.
    pub fn new(samples: usize, extent: f64) -> CoordinateGrid {
        let axis = Array1::linspace(-extent / 2., extent / 2., samples);
        let (x, y) = meshgrid(&axis, &axis);
        CoordinateGrid { x, y }
    }

    pub fn dim(&self) -> (usize, usize) {
        self.x.dim()
    }
}

use geo::{Distance, Euclidean, Length, Line, LineString, MultiLineString, Polygon};

pub fn line_length(ls: &LineString<f64>) -> f64 {
    ls.length::<Euclidean>()
}

pub fn lines_length(mls: &MultiLineString<f64>) -> f64 {
    mls.length::<Euclidean>()
}

/// Euclidean distance between two segments.
pub fn segment_distance(a: Line<f64>, b: Line<f64>) -> f64 {
    Euclidean::distance(&a, &b)
}

/// Distance from a polygon (interior included) to a polyline. Infinite for
/// an empty polyline.
pub fn polygon_line_distance(poly: &Polygon<f64>, ls: &LineString<f64>) -> f64 {
    if ls.0.is_empty() {
        return f64::INFINITY;
    }
    Euclidean::distance(poly, ls)
}

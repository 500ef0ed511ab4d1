///Represents a vector in 2D arena space.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Vector2 {
    ///Value along the x-axis.
    pub x: f32,
    ///Value along the y-axis.
    /// Positive direction is down, matching screen coordinates.
    pub y: f32,
}

impl Vector2 {
    pub fn new(x: f32, y: f32) -> Self {
        Vector2 { x, y }
    }

    ///Unit vector at the given angle in radians.
    pub fn from_angle(angle: f32) -> Self {
        Vector2 {
            x: angle.cos(),
            y: angle.sin(),
        }
    }

    ///Returns the magnitude of the vector.
    pub fn magnitude(&self) -> f32 {
        self.magnitude_squared().sqrt()
    }

    pub fn magnitude_squared(&self) -> f32 {
        self.x * self.x + self.y * self.y
    }

    ///Returns the normalized vector, or zero for a zero-length input.
    pub fn normalize(&self) -> Vector2 {
        let mag = self.magnitude();
        if mag == 0.0 {
            Vector2 { x: 0.0, y: 0.0 }
        } else {
            Vector2 {
                x: self.x / mag,
                y: self.y / mag,
            }
        }
    }

    ///Returns the scaled vector.
    pub fn scale(&self, scalar: f32) -> Vector2 {
        Vector2 {
            x: self.x * scalar,
            y: self.y * scalar,
        }
    }

    ///Returns the sum of two vectors.
    pub fn add(&self, other: &Vector2) -> Vector2 {
        Vector2 {
            x: self.x + other.x,
            y: self.y + other.y,
        }
    }

    ///Returns `self - other`.
    pub fn sub(&self, other: &Vector2) -> Vector2 {
        Vector2 {
            x: self.x - other.x,
            y: self.y - other.y,
        }
    }

    ///Rescales the vector down to `max` when it is longer, keeping its direction.
    pub fn clamp_magnitude(&self, max: f32) -> Vector2 {
        let speed = self.magnitude();
        if speed > max && speed > 0.0 {
            self.scale(max / speed)
        } else {
            *self
        }
    }
}

///Wraps a coordinate into `[0, size)`.
///
///One correction is enough for the bounded per-step displacement; the second
///check catches float rounding that lands exactly on the far edge.
pub fn wrap_axis(value: f32, size: f32) -> f32 {
    let mut wrapped = value;
    if wrapped < 0.0 {
        wrapped += size;
    } else if wrapped >= size {
        wrapped -= size;
    }

    if wrapped >= size || wrapped < 0.0 {
        wrapped = wrapped.rem_euclid(size);
        if wrapped >= size {
            wrapped = 0.0;
        }
    }
    wrapped
}

///Circle-circle overlap, touching counts as overlapping.
pub fn circles_overlap(a: Vector2, ra: f32, b: Vector2, rb: f32) -> bool {
    let reach = ra + rb;
    b.sub(&a).magnitude_squared() <= reach * reach
}

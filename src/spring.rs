//! Critically-damped spring-damper integrators.
//!
//! Every function here is pure and uses the exact exponential solution of the
//! spring equations, so any time step (including very large prediction
//! horizons) stays stable. Negative or NaN time steps are treated as zero,
//! and a zero time step leaves the state untouched.
//!
//! Springs are parameterized by a **damping ratio** in `[0, 1]`: `0` reaches
//! the goal instantly, `1` does not move at all. Internally the ratio is
//! turned into a half-life (the time needed to cover half of the remaining
//! distance) with [`damping_ratio_to_half_life`].

use std::ops::{Add, Mul, Sub};

use bevy::math::{Quat, Vec2, Vec3};

/// Natural log of 2, the decay constant of a half-life.
pub const LN_2: f32 = std::f32::consts::LN_2;

/// Smallest half-life / damping accepted before division.
const HALF_LIFE_EPSILON: f32 = 1e-5;

/// Rotation axes shorter than this are considered degenerate.
const AXIS_EPSILON: f32 = 1e-8;

/// A value that can be driven by a linear spring.
pub trait SpringValue:
    Copy + Add<Output = Self> + Sub<Output = Self> + Mul<f32, Output = Self>
{
    /// The rest value of the spring.
    const ZERO: Self;
}

impl SpringValue for f32 {
    const ZERO: Self = 0.0;
}

impl SpringValue for Vec2 {
    const ZERO: Self = Vec2::ZERO;
}

impl SpringValue for Vec3 {
    const ZERO: Self = Vec3::ZERO;
}

/// Clamp a time step to a usable non-negative value.
#[inline]
pub fn sanitize_dt(dt: f32) -> f32 {
    if dt.is_nan() || dt < 0.0 {
        0.0
    } else {
        dt
    }
}

/// Convert a half-life (seconds) into a damping coefficient.
#[inline]
pub fn half_life_to_damping(half_life: f32) -> f32 {
    (4.0 * LN_2) / half_life.max(HALF_LIFE_EPSILON)
}

/// Convert a damping coefficient into a half-life (seconds).
#[inline]
pub fn damping_to_half_life(damping: f32) -> f32 {
    (4.0 * LN_2) / damping.max(HALF_LIFE_EPSILON)
}

/// Map a damping ratio in `[0, 1]` to a half-life in seconds.
///
/// Returns `None` for ratios of `1` or more: the spring is frozen.
/// Values below zero (and NaN) behave like `0`.
#[inline]
pub fn damping_ratio_to_half_life(damping_ratio: f32) -> Option<f32> {
    let ratio = damping_ratio.max(0.0);
    if ratio >= 1.0 {
        None
    } else {
        Some(ratio / (1.0 - ratio))
    }
}

/// Advance a spring toward `goal` using the implicit critically damped solution.
///
/// `x` and `v` are updated in place. A ratio of `1` holds `x` and zeroes `v`.
pub fn simple_spring_damper_implicit<T: SpringValue>(
    x: &mut T,
    v: &mut T,
    goal: T,
    damping_ratio: f32,
    dt: f32,
) {
    let dt = sanitize_dt(dt);
    if dt == 0.0 {
        return;
    }
    let Some(half_life) = damping_ratio_to_half_life(damping_ratio) else {
        *v = T::ZERO;
        return;
    };

    let y = half_life_to_damping(half_life) / 2.0;
    let j0 = *x - goal;
    let j1 = *v + j0 * y;
    let eydt = (-y * dt).exp();
    if eydt == 0.0 {
        *x = goal;
        *v = T::ZERO;
        return;
    }

    *x = (j0 + j1 * dt) * eydt + goal;
    *v = (*v - j1 * (y * dt)) * eydt;
}

/// Rotational counterpart of [`simple_spring_damper_implicit`].
///
/// The difference between `rotation` and `goal` is integrated in scaled
/// angle-axis space; `angular_velocity` is in radians per second. The output
/// rotation is renormalized on every call.
pub fn simple_spring_damper_implicit_rotation(
    rotation: &mut Quat,
    angular_velocity: &mut Vec3,
    goal: Quat,
    damping_ratio: f32,
    dt: f32,
) {
    let dt = sanitize_dt(dt);
    if dt == 0.0 {
        return;
    }
    let Some(half_life) = damping_ratio_to_half_life(damping_ratio) else {
        *rotation = renormalize(*rotation);
        *angular_velocity = Vec3::ZERO;
        return;
    };

    let goal = renormalize(goal);
    let y = half_life_to_damping(half_life) / 2.0;
    let j0 = quat_to_scaled_angle_axis(quat_abs(*rotation * goal.inverse()));
    let j1 = *angular_velocity + j0 * y;
    let eydt = (-y * dt).exp();
    if eydt == 0.0 {
        *rotation = goal;
        *angular_velocity = Vec3::ZERO;
        return;
    }

    let offset = quat_from_scaled_angle_axis((j0 + j1 * dt) * eydt);
    *rotation = renormalize(offset * goal);
    *angular_velocity = (*angular_velocity - j1 * (y * dt)) * eydt;
}

/// Acceleration-aware spring used for horizontal character movement.
///
/// Velocity converges to `desired_velocity` while the position follows the
/// integral of the velocity curve, which gives smooth acceleration.
pub fn character_position_update(
    position: &mut Vec2,
    velocity: &mut Vec2,
    acceleration: &mut Vec2,
    desired_velocity: Vec2,
    damping_ratio: f32,
    dt: f32,
) {
    let dt = sanitize_dt(dt);
    if dt == 0.0 {
        return;
    }
    let Some(half_life) = damping_ratio_to_half_life(damping_ratio) else {
        *velocity = Vec2::ZERO;
        *acceleration = Vec2::ZERO;
        return;
    };

    let y = half_life_to_damping(half_life) / 2.0;
    let y2 = y * y;
    let j0 = *velocity - desired_velocity;
    let j1 = *acceleration + j0 * y;
    let eydt = (-y * dt).exp();

    *position = eydt * ((-j1) / y2 + (-j0 - j1 * dt) / y)
        + j1 / y2
        + j0 / y
        + desired_velocity * dt
        + *position;
    *velocity = eydt * (j0 + j1 * dt) + desired_velocity;
    *acceleration = eydt * (*acceleration - j1 * (y * dt));
}

/// Spring that decays `x` toward zero, e.g. an offset left behind by a snap.
pub fn decay_spring_damper_implicit<T: SpringValue>(
    x: &mut T,
    v: &mut T,
    half_life: f32,
    dt: f32,
) {
    let dt = sanitize_dt(dt);
    if dt == 0.0 {
        return;
    }
    let y = half_life_to_damping(half_life.max(0.0)) / 2.0;
    let j1 = *v + *x * y;
    let eydt = (-y * dt).exp();
    if eydt == 0.0 {
        *x = T::ZERO;
        *v = T::ZERO;
        return;
    }

    *x = (*x + j1 * dt) * eydt;
    *v = (*v - j1 * (y * dt)) * eydt;
}

/// Fraction of a remaining difference to remove after `dt` seconds.
#[inline]
fn adjustment_factor(half_life: f32, dt: f32) -> f32 {
    let dt = sanitize_dt(dt);
    let half_life = half_life.max(0.0);
    if half_life < HALF_LIFE_EPSILON {
        return if dt > 0.0 { 1.0 } else { 0.0 };
    }
    1.0 - (-(LN_2 * dt) / half_life).exp()
}

/// Exponentially damp a difference, returning the part to apply this step.
///
/// After exactly `half_life` seconds the returned delta is half of
/// `difference`. A zero half-life applies the whole difference at once.
pub fn damp_adjustment_implicit<T: SpringValue>(difference: T, half_life: f32, dt: f32) -> T {
    difference * adjustment_factor(half_life, dt)
}

/// Rotational counterpart of [`damp_adjustment_implicit`].
pub fn damp_adjustment_implicit_rotation(difference: Quat, half_life: f32, dt: f32) -> Quat {
    let scaled = quat_to_scaled_angle_axis(quat_abs(renormalize(difference)));
    quat_from_scaled_angle_axis(scaled * adjustment_factor(half_life, dt))
}

/// Flip a quaternion onto the hemisphere with a non-negative `w`.
#[inline]
pub fn quat_abs(q: Quat) -> Quat {
    if q.w < 0.0 {
        -q
    } else {
        q
    }
}

/// Rotation as `axis * angle` (radians). Degenerate axes yield zero.
pub fn quat_to_scaled_angle_axis(q: Quat) -> Vec3 {
    let v = Vec3::new(q.x, q.y, q.z);
    let length = v.length();
    if !length.is_finite() || length < AXIS_EPSILON {
        return Vec3::ZERO;
    }
    let angle = 2.0 * length.atan2(q.w);
    v / length * angle
}

/// Inverse of [`quat_to_scaled_angle_axis`]. Degenerate axes yield identity.
pub fn quat_from_scaled_angle_axis(scaled: Vec3) -> Quat {
    let angle = scaled.length();
    if !angle.is_finite() || angle < AXIS_EPSILON {
        return Quat::IDENTITY;
    }
    Quat::from_axis_angle(scaled / angle, angle)
}

/// Normalize a quaternion, falling back to identity when that is impossible.
#[inline]
pub fn renormalize(q: Quat) -> Quat {
    let length_squared = q.length_squared();
    if length_squared.is_finite() && length_squared > AXIS_EPSILON {
        q * length_squared.sqrt().recip()
    } else {
        Quat::IDENTITY
    }
}

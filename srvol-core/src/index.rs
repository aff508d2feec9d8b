//! Dense index maps for the detector numbering schemes.
//!
//! Native numbering can be negative and skips zero along eta. Each map
//! below turns a native coordinate into a zero-based, gap-free index and
//! back. Values outside the documented domain are rejected, never clamped.
#![allow(
    clippy::cast_possible_truncation,
    clippy::cast_possible_wrap,
    clippy::cast_sign_loss
)]

use crate::error::{Error, Result, Space};
use crate::layout::{N_EB_ETA, N_EB_PHI, N_EE_X, N_TT_ETA, N_TT_PHI};

/// Largest barrel |ieta|.
pub const EB_MAX_IETA: i32 = 85;
/// Largest trigger-tower |ieta|.
pub const TT_MAX_IETA: i32 = 28;

#[inline]
fn coordinate_error(space: Space, value: i32) -> Error {
    Error::InvalidCoordinate { space, value }
}

#[inline]
fn check_index(space: Space, index: usize, len: usize) -> Result<()> {
    if index < len {
        Ok(())
    } else {
        Err(Error::InvalidIndex { space, index, len })
    }
}

/// Maps `[-max,-1] ∪ [1,max]` onto `0..2*max`.
#[inline]
fn signed_to_index(space: Space, value: i32, max: i32) -> Result<usize> {
    if value == 0 || !(-max..=max).contains(&value) {
        return Err(coordinate_error(space, value));
    }
    let index = if value < 0 { value + max } else { value + max - 1 };
    Ok(index as usize)
}

#[inline]
fn index_to_signed(space: Space, index: usize, max: i32) -> Result<i32> {
    check_index(space, index, 2 * max as usize)?;
    let index = index as i32;
    Ok(if index < max { index - max } else { index - max + 1 })
}

/// Maps `[1,len]` onto `0..len`.
#[inline]
fn one_based_to_index(space: Space, value: i32, len: usize) -> Result<usize> {
    if value < 1 || value as usize > len {
        return Err(coordinate_error(space, value));
    }
    Ok((value - 1) as usize)
}

#[inline]
fn index_to_one_based(space: Space, index: usize, len: usize) -> Result<i32> {
    check_index(space, index, len)?;
    Ok(index as i32 + 1)
}

/// Barrel crystal ieta (`-85..=-1`, `1..=85`) to index `0..170`.
pub fn barrel_eta_to_index(ieta: i32) -> Result<usize> {
    signed_to_index(Space::BarrelEta, ieta, EB_MAX_IETA)
}

/// Inverse of [`barrel_eta_to_index`].
pub fn index_to_barrel_eta(index: usize) -> Result<i32> {
    index_to_signed(Space::BarrelEta, index, EB_MAX_IETA)
}

/// Barrel crystal iphi (`1..=360`) to index `0..360`.
pub fn barrel_phi_to_index(iphi: i32) -> Result<usize> {
    one_based_to_index(Space::BarrelPhi, iphi, N_EB_PHI)
}

/// Inverse of [`barrel_phi_to_index`].
pub fn index_to_barrel_phi(index: usize) -> Result<i32> {
    index_to_one_based(Space::BarrelPhi, index, N_EB_PHI)
}

/// Endcap crystal ix or iy (`1..=100`) to index `0..100`.
pub fn endcap_xy_to_index(ixy: i32) -> Result<usize> {
    one_based_to_index(Space::EndcapXy, ixy, N_EE_X)
}

/// Inverse of [`endcap_xy_to_index`].
pub fn index_to_endcap_xy(index: usize) -> Result<i32> {
    index_to_one_based(Space::EndcapXy, index, N_EE_X)
}

/// Trigger-tower ieta (`-28..=-1`, `1..=28`) to index `0..56`.
pub fn tower_eta_to_index(ieta: i32) -> Result<usize> {
    signed_to_index(Space::TowerEta, ieta, TT_MAX_IETA)
}

/// Inverse of [`tower_eta_to_index`].
pub fn index_to_tower_eta(index: usize) -> Result<i32> {
    index_to_signed(Space::TowerEta, index, TT_MAX_IETA)
}

/// Trigger-tower iphi (`1..=72`) to index `0..72`.
pub fn tower_phi_to_index(iphi: i32) -> Result<usize> {
    one_based_to_index(Space::TowerPhi, iphi, N_TT_PHI)
}

/// Inverse of [`tower_phi_to_index`].
pub fn index_to_tower_phi(index: usize) -> Result<i32> {
    index_to_one_based(Space::TowerPhi, index, N_TT_PHI)
}

// Grid sizes and the signed maps have to agree.
const _: () = assert!(2 * EB_MAX_IETA as usize == N_EB_ETA);
const _: () = assert!(2 * TT_MAX_IETA as usize == N_TT_ETA);

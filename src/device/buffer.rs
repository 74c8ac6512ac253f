//! Host and device field-element buffers.
//!
//! The batch executor only reads and writes buffers through [`FieldSlice`]
//! and [`FieldSliceMut`], which pair the elements with a [`Location`] tag.
//! Plain slices and vectors live on the host; a [`DeviceVec`] is resident on
//! the device of the context that allocated it.

use super::ExecutionContext;
use crate::error::{ErrorCode, PoseidonResult};
use crate::field::Fr;

/// Where a buffer lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Location {
    /// Host memory.
    Host,
    /// Memory local to the given device.
    Device(usize),
}

/// Read access to a buffer of field elements.
pub trait FieldSlice {
    /// The elements.
    fn as_fields(&self) -> &[Fr];

    /// Where the elements live.
    fn location(&self) -> Location;
}

/// Write access to a buffer of field elements.
pub trait FieldSliceMut: FieldSlice {
    /// The elements, mutably.
    fn as_fields_mut(&mut self) -> &mut [Fr];
}

impl FieldSlice for [Fr] {
    fn as_fields(&self) -> &[Fr] {
        self
    }

    fn location(&self) -> Location {
        Location::Host
    }
}

impl FieldSliceMut for [Fr] {
    fn as_fields_mut(&mut self) -> &mut [Fr] {
        self
    }
}

impl FieldSlice for Vec<Fr> {
    fn as_fields(&self) -> &[Fr] {
        self
    }

    fn location(&self) -> Location {
        Location::Host
    }
}

impl FieldSliceMut for Vec<Fr> {
    fn as_fields_mut(&mut self) -> &mut [Fr] {
        self
    }
}

/// Device-resident buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceVec {
    device_id: usize,
    data: Vec<Fr>,
}

impl DeviceVec {
    /// Allocate `len` zeroed elements on the context's device.
    pub fn zeroed(len: usize, ctx: &ExecutionContext) -> Self {
        Self {
            device_id: ctx.device_id(),
            data: vec![Fr::ZERO; len],
        }
    }

    /// Copy host elements onto the context's device.
    pub fn from_host(host: &[Fr], ctx: &ExecutionContext) -> Self {
        Self {
            device_id: ctx.device_id(),
            data: host.to_vec(),
        }
    }

    /// Copy the contents back into a host slice of the same length.
    pub fn copy_to_host(&self, host: &mut [Fr]) -> PoseidonResult<()> {
        if host.len() != self.data.len() {
            return Err(ErrorCode::ShapeMismatch(format!(
                "host buffer has {} elements, device buffer has {}",
                host.len(),
                self.data.len()
            )));
        }
        host.copy_from_slice(&self.data);
        Ok(())
    }

    /// Copy the contents into a new host vector.
    pub fn to_host(&self) -> Vec<Fr> {
        self.data.clone()
    }

    /// Device holding this buffer.
    pub fn device_id(&self) -> usize {
        self.device_id
    }

    /// Number of elements.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the buffer holds no elements.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl FieldSlice for DeviceVec {
    fn as_fields(&self) -> &[Fr] {
        &self.data
    }

    fn location(&self) -> Location {
        Location::Device(self.device_id)
    }
}

impl FieldSliceMut for DeviceVec {
    fn as_fields_mut(&mut self) -> &mut [Fr] {
        &mut self.data
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_locations() {
        let ctx = ExecutionContext::new(3, 1).unwrap();
        let host = vec![Fr::ONE; 4];
        let device = DeviceVec::from_host(&host, &ctx);

        assert_eq!(host.location(), Location::Host);
        assert_eq!(host.as_slice().location(), Location::Host);
        assert_eq!(device.location(), Location::Device(3));
    }

    #[test]
    fn test_copy_back() {
        let ctx = ExecutionContext::default();
        let device = DeviceVec::from_host(&[Fr::from_u64(1), Fr::from_u64(2)], &ctx);

        let mut host = vec![Fr::ZERO; 2];
        device.copy_to_host(&mut host).unwrap();
        assert_eq!(host, device.to_host());

        let mut short = vec![Fr::ZERO; 1];
        assert!(matches!(
            device.copy_to_host(&mut short),
            Err(ErrorCode::ShapeMismatch(_))
        ));
    }
}

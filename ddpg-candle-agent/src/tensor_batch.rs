use candle_core::{Device, IndexOp, Tensor};
use ddpg_core::generic_replay_buffer::BatchBase;

/// A buffer consisting of a [`Tensor`].
///
/// The internal buffer is allocated lazily on the first push, with the shape
/// `[capacity, data.dims()[1..]]`.
///
/// [`Tensor`]: https://docs.rs/candle-core/0.8.4/candle_core/struct.Tensor.html
#[derive(Clone, Debug)]
pub struct TensorBatch {
    buf: Option<Tensor>,
    capacity: usize,
}

impl TensorBatch {
    /// Creates a batch of the rows of the given tensor.
    pub fn from_tensor(t: Tensor) -> Self {
        let capacity = t.dims()[0] as _;
        Self {
            buf: Some(t),
            capacity,
        }
    }
}

impl BatchBase for TensorBatch {
    fn new(capacity: usize) -> Self {
        Self {
            buf: None,
            capacity,
        }
    }

    /// Pushes given data.
    ///
    /// If the data spills over the capacity, the overhang wraps around to the
    /// head of the buffer.
    fn push(&mut self, index: usize, data: Self) {
        if data.buf.is_none() {
            return;
        }

        let batch_size = data.buf.as_ref().unwrap().dims()[0];
        if batch_size == 0 {
            return;
        }

        if self.buf.is_none() {
            let mut shape = data.buf.as_ref().unwrap().dims().to_vec();
            shape[0] = self.capacity;
            let dtype = data.buf.as_ref().unwrap().dtype();
            let device = Device::Cpu;
            self.buf = Some(Tensor::zeros(shape, dtype, &device).unwrap());
        }

        if index + batch_size > self.capacity {
            let batch_size = self.capacity - index;
            let data = &data.buf.unwrap();
            let data1 = data.i((..batch_size,)).unwrap();
            let data2 = data.i((batch_size..,)).unwrap();
            self.buf
                .as_mut()
                .unwrap()
                .slice_set(&data1, 0, index)
                .unwrap();
            self.buf.as_mut().unwrap().slice_set(&data2, 0, 0).unwrap();
        } else {
            self.buf
                .as_mut()
                .unwrap()
                .slice_set(&data.buf.unwrap(), 0, index)
                .unwrap();
        }
    }

    fn sample(&self, ixs: &Vec<usize>) -> Self {
        let capacity = ixs.len();
        let ixs = {
            let device = self.buf.as_ref().unwrap().device();
            let ixs = ixs.iter().map(|x| *x as u32).collect();
            Tensor::from_vec(ixs, (capacity,), device).unwrap()
        };
        let buf = Some(self.buf.as_ref().unwrap().index_select(&ixs, 0).unwrap());
        Self { buf, capacity }
    }
}

impl From<TensorBatch> for Tensor {
    fn from(b: TensorBatch) -> Self {
        b.buf.unwrap()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use candle_core::error::Result;

    #[test]
    fn test_push_wraps_around() -> Result<()> {
        let mut b = TensorBatch::new(4);
        let data =
            TensorBatch::from_tensor(Tensor::from_slice(&[0f32, 1., 2.], (3, 1), &Device::Cpu)?);
        b.push(2, data);

        let buf: Tensor = b.into();
        let v: Vec<f32> = buf.flatten_all()?.to_vec1()?;
        assert_eq!(v, vec![2., 0., 0., 1.]);
        Ok(())
    }

    #[test]
    fn test_sample_picks_rows() -> Result<()> {
        let t = Tensor::from_slice(&[0f32, 10., 20., 30.], (4, 1), &Device::Cpu)?;
        let b = TensorBatch::from_tensor(t);
        let s = b.sample(&vec![3, 1, 3]);

        let buf: Tensor = s.into();
        let v: Vec<f32> = buf.flatten_all()?.to_vec1()?;
        assert_eq!(v, vec![30., 10., 30.]);
        Ok(())
    }
}

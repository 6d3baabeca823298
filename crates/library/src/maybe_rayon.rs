/// Parallel iteration when the `parallel` feature is on, plain iteration otherwise.
///
/// Only the entry points used by this crate are covered: `into_par_iter` on
/// index ranges and `par_iter_mut` on slices. Everything chained after them
/// resolves to the standard `Iterator` methods in the sequential build.
#[cfg(feature = "parallel")]
pub use rayon::prelude::*;

#[cfg(not(feature = "parallel"))]
mod sequential {
    pub trait IntoParallelIterator {
        type Iter;
        fn into_par_iter(self) -> Self::Iter;
    }

    impl<I: IntoIterator> IntoParallelIterator for I {
        type Iter = I::IntoIter;
        fn into_par_iter(self) -> Self::Iter {
            self.into_iter()
        }
    }

    pub trait ParallelSliceIterMut<T> {
        fn par_iter_mut(&mut self) -> std::slice::IterMut<'_, T>;
    }

    impl<T> ParallelSliceIterMut<T> for [T] {
        fn par_iter_mut(&mut self) -> std::slice::IterMut<'_, T> {
            self.iter_mut()
        }
    }
}

#[cfg(not(feature = "parallel"))]
pub use sequential::*;

use crate::ShapeMismatch;

pub trait Operation {
    fn name(&self) -> &str;
}

impl Operation for str {
    fn name(&self) -> &str {
        self
    }
}

impl Operation for String {
    fn name(&self) -> &str {
        self.as_str()
    }
}

impl<O> Operation for &O
where O: Operation + ?Sized {
    fn name(&self) -> &str {
        (**self).name()
    }
}

/// Numeric backend performing an operation on the leaves found at one key chain.
pub trait Backend<T> {
    type Op: Operation + ?Sized;
    type Output;
    type Error: std::error::Error + 'static;

    fn call(&self, op: &Self::Op, args: &[&T]) -> Result<Self::Output, Self::Error>;
}

impl<T, B> Backend<T> for &B
where B: Backend<T> + ?Sized {
    type Op = B::Op;
    type Output = B::Output;
    type Error = B::Error;

    fn call(&self, op: &Self::Op, args: &[&T]) -> Result<Self::Output, Self::Error> {
        (**self).call(op, args)
    }
}

/// Backend given by a closure taking the operation name.
pub struct FnBackend<F> {
    f: F
}

impl<F> FnBackend<F> {
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

impl<T, U, E, F> Backend<T> for FnBackend<F>
where
    F: Fn(&str, &[&T]) -> Result<U, E>,
    E: std::error::Error + 'static
{
    type Op = str;
    type Output = U;
    type Error = E;

    fn call(&self, op: &str, args: &[&T]) -> Result<U, E> {
        (self.f)(op, args)
    }
}

/// Output leaves that can receive a result into their existing storage.
pub trait Writeback: Sized {
    fn check_shape(&self, src: &Self) -> Result<(), ShapeMismatch>;
    fn write_back(&mut self, src: Self);
}

macro_rules! impl_writeback {
    ($($t:ty),*) => {
        $(impl Writeback for $t {
            fn check_shape(&self, _: &Self) -> Result<(), ShapeMismatch> {
                Ok(())
            }

            fn write_back(&mut self, src: Self) {
                *self = src
            }
        })*
    };
}

impl_writeback!(i32, i64, u32, u64, usize, isize, f32, f64, bool, String);

impl<T> Writeback for Vec<T> {
    fn check_shape(&self, src: &Self) -> Result<(), ShapeMismatch> {
        if self.len() == src.len() {
            Ok(())
        } else {
            Err(ShapeMismatch::new(format!("[{}]", self.len()), format!("[{}]", src.len())))
        }
    }

    fn write_back(&mut self, src: Self) {
        self.clear();
        self.extend(src)
    }
}

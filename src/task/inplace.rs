use std::fmt;
use std::marker::PhantomData;
use std::mem::{self, ManuallyDrop, MaybeUninit};
use std::ptr;

/// Default inline capacity, in bytes, of a task callable.
pub const TASK_CAPACITY: usize = 128;

/// Strictest alignment a stored callable may require.
pub const INPLACE_ALIGN: usize = 16;

#[repr(C, align(16))]
struct Storage<const N: usize>([MaybeUninit<u8>; N]);

/// A type-erased `FnOnce(A) -> R` stored inline in `N` bytes.
///
/// The callable never touches the heap. Its size and alignment are checked
/// when [`InplaceFn::new`] is monomorphised, so a closure that does not fit
/// is rejected at compile time rather than truncated or boxed.
///
/// Erasure uses two function pointers: one to consume and invoke the stored
/// value, one to drop it if it is never invoked. Rust moves are bitwise, so
/// no relocation hook is needed.
///
/// ```rust
/// use opifex::task::InplaceFn;
///
/// let offset = 40;
/// let f: InplaceFn<u32, u32, 32> = InplaceFn::new(move |x| x + offset);
/// assert_eq!(f.call(2), 42);
/// ```
pub struct InplaceFn<A, R, const N: usize = TASK_CAPACITY> {
    storage: Storage<N>,
    invoke: unsafe fn(*mut u8, A) -> R,
    drop: unsafe fn(*mut u8),
    _marker: PhantomData<fn(A) -> R>,
}

impl<A, R, const N: usize> InplaceFn<A, R, N> {
    /// Stores `f` inline.
    ///
    /// The raw byte storage makes `InplaceFn` `Send` regardless of what it
    /// holds, so `F: Send` is required here.
    pub fn new<F>(f: F) -> Self
    where
        F: FnOnce(A) -> R + Send + 'static,
    {
        const {
            assert!(
                mem::size_of::<F>() <= N,
                "callable does not fit the inline capacity"
            );
            assert!(
                mem::align_of::<F>() <= INPLACE_ALIGN,
                "callable alignment exceeds the inline storage alignment"
            );
        }

        let mut storage = Storage([MaybeUninit::uninit(); N]);

        // Safety: size and alignment were checked above.
        unsafe { ptr::write(storage.0.as_mut_ptr().cast::<F>(), f) };

        Self {
            storage,
            invoke: invoke_raw::<F, A, R>,
            drop: drop_raw::<F>,
            _marker: PhantomData,
        }
    }

    /// Consumes the callable and invokes it with `arg`.
    pub fn call(self, arg: A) -> R {
        let mut this = ManuallyDrop::new(self);

        // Safety: the storage holds a live `F`; `this` is never dropped, so the
        // value read out by `invoke` is not dropped twice even on unwind.
        unsafe { (this.invoke)(this.storage.0.as_mut_ptr().cast(), arg) }
    }
}

impl<A, R, const N: usize> Drop for InplaceFn<A, R, N> {
    fn drop(&mut self) {
        // Safety: `call` bypasses this impl, so the stored value is still live.
        unsafe { (self.drop)(self.storage.0.as_mut_ptr().cast()) }
    }
}

impl<A, R, const N: usize> fmt::Debug for InplaceFn<A, R, N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InplaceFn").field("capacity", &N).finish()
    }
}

unsafe fn invoke_raw<F, A, R>(ptr: *mut u8, arg: A) -> R
where
    F: FnOnce(A) -> R,
{
    let f = unsafe { ptr::read(ptr.cast::<F>()) };
    f(arg)
}

unsafe fn drop_raw<F>(ptr: *mut u8) {
    unsafe { ptr::drop_in_place(ptr.cast::<F>()) }
}

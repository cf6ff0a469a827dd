#![forbid(unsafe_code)]

//! Raw listener registration tied to a component's lifetime.

use std::rc::Rc;

use bindery_core::{Arg, Listenable, Listener, Read, Value};
use bindery_runtime::{ByPtr, Cleanup, Cx, Subscription};

use crate::resolve::{Target, use_source};

/// Call `listener` whenever `read` changes for `args` on the source
/// `target` resolves to.
///
/// The listener is registered after render and re-registered when the
/// resolved source, the read, the arguments or `deps` change. It is always
/// removed on unmount.
pub fn use_listener(
    cx: &mut Cx<'_>,
    target: &Target,
    read: Read,
    args: &[Arg],
    listener: impl Fn(&[Arg]) + 'static,
    deps: Vec<Value>,
) {
    let source = use_source(cx, read.aspect().family(), target);
    let args = args.to_vec();
    let key: (Option<ByPtr<dyn Listenable>>, Read, Vec<Arg>, Vec<Value>) =
        (ByPtr::opt(source.as_ref()), read, args.clone(), deps);
    cx.use_effect(key, move || {
        let source = source?;
        let listener: Listener = Rc::new(listener);
        let Some(handle) = source.add_listener(read, &args, listener) else {
            tracing::warn!(%read, "source refused listener");
            return None;
        };
        tracing::trace!(%read, handle = handle.raw(), "listener added");
        let subscription = Subscription::new(move || source.del_listener(handle));
        Some(Box::new(move || drop(subscription)) as Cleanup)
    });
}

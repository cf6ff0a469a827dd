#![forbid(unsafe_code)]

//! Checkpoints hooks: undo/redo history.

use std::rc::Rc;

use bindery_core::aspect::checkpoints::{CHECKPOINT, CHECKPOINT_IDS};
use bindery_core::{Arg, Command, Family, Id, SourceRef, Value, args};
use bindery_runtime::Cx;

use super::read;
use crate::lifecycle::use_create;
use crate::mutate::{Mutator, WriteSpec, use_command_callback, use_write_callback};
use crate::resolve::{Target, use_source};

pub fn use_checkpoints(cx: &mut Cx<'_>, id: Option<&str>) -> Option<SourceRef> {
    use_source(cx, Family::Checkpoints, &Target::from(id))
}

pub fn use_create_checkpoints(
    cx: &mut Cx<'_>,
    store: Option<&SourceRef>,
    deps: Vec<Value>,
    create: impl FnOnce(&SourceRef) -> SourceRef + 'static,
) -> Option<SourceRef> {
    use_create(cx, Family::Checkpoints, store, deps, create)
}

/// Backward ids, current id and forward ids.
pub fn use_checkpoint_ids(cx: &mut Cx<'_>, target: &Target) -> Rc<Value> {
    read(cx, target, CHECKPOINT_IDS, &[])
}

/// Label of one checkpoint.
pub fn use_checkpoint(cx: &mut Cx<'_>, checkpoint: &str, target: &Target) -> Rc<Value> {
    read(cx, target, CHECKPOINT, &args![checkpoint])
}

/// Callback recording a checkpoint labelled with what `label` returns.
pub fn use_set_checkpoint_callback<P: 'static>(
    cx: &mut Cx<'_>,
    label: impl Fn(&P) -> String + 'static,
    deps: Vec<Value>,
    target: &Target,
) -> Rc<Mutator<P>> {
    use_write_callback(
        cx,
        WriteSpec::command(Command::AddCheckpoint)
            .target(target.clone())
            .arg_with(move |param, _| Arg::Id(label(param)))
            .deps(deps),
    )
}

pub fn use_go_backward_callback(cx: &mut Cx<'_>, target: &Target) -> Rc<Mutator<()>> {
    use_command_callback(cx, target, Command::GoBackward, &[])
}

pub fn use_go_forward_callback(cx: &mut Cx<'_>, target: &Target) -> Rc<Mutator<()>> {
    use_command_callback(cx, target, Command::GoForward, &[])
}

/// Callback jumping to the checkpoint `checkpoint` returns.
pub fn use_go_to_callback<P: 'static>(
    cx: &mut Cx<'_>,
    checkpoint: impl Fn(&P) -> Id + 'static,
    deps: Vec<Value>,
    target: &Target,
) -> Rc<Mutator<P>> {
    use_write_callback(
        cx,
        WriteSpec::command(Command::GoTo)
            .target(target.clone())
            .arg_with(move |param, _| Arg::Id(checkpoint(param)))
            .deps(deps),
    )
}

/// Everything an undo/redo control needs.
#[derive(Debug)]
pub struct UndoInformation {
    pub can_undo: bool,
    pub undo: Rc<Mutator<()>>,
    pub undo_checkpoint: Option<Id>,
    pub undo_label: Rc<Value>,
    pub can_redo: bool,
    pub redo: Rc<Mutator<()>>,
    pub redo_checkpoint: Option<Id>,
    pub redo_label: Rc<Value>,
}

/// Undo and redo callbacks with the checkpoints they act on.
///
/// Undo is described by the current checkpoint, the one it would leave, and
/// has none while changes are pending. Redo is described by the first
/// forward checkpoint, the one it would move to.
pub fn use_undo_information(cx: &mut Cx<'_>, target: &Target) -> UndoInformation {
    let ids = use_checkpoint_ids(cx, target);
    let ids = ids.as_checkpoints().cloned().unwrap_or_default();
    let undo_checkpoint = ids.current.clone();
    let redo_checkpoint = ids.forward.first().cloned();
    let undo = use_go_backward_callback(cx, target);
    let redo = use_go_forward_callback(cx, target);
    let undo_label = read(cx, target, CHECKPOINT, &[Arg::from(undo_checkpoint.clone())]);
    let redo_label = read(cx, target, CHECKPOINT, &[Arg::from(redo_checkpoint.clone())]);
    UndoInformation {
        can_undo: ids.can_go_backward(),
        undo,
        undo_checkpoint,
        undo_label,
        can_redo: ids.can_go_forward(),
        redo,
        redo_checkpoint,
        redo_label,
    }
}

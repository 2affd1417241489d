// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn buffer_sink_captures_lines() {
    let (sink, buffer) = OutputSink::buffer();
    sink.write_line("first");
    sink.write_line("second");
    assert_eq!(buffer.contents(), "first\nsecond\n");
    assert_eq!(buffer.lines(), vec!["first", "second"]);
}

#[test]
fn buffer_sink_clones_share_the_target() {
    let (sink, buffer) = OutputSink::buffer();
    let clone = sink.clone();
    sink.write_line("from original");
    clone.write_line("from clone");
    assert_eq!(buffer.lines(), vec!["from original", "from clone"]);
}

#[test]
fn null_sink_swallows_output() {
    let sink = OutputSink::null();
    sink.write_line("into the void");
}

#[test]
fn empty_line_still_writes_newline() {
    let (sink, buffer) = OutputSink::buffer();
    sink.write_line("");
    assert_eq!(buffer.contents(), "\n");
}

mod common;

use std::{fs, time::Duration};

use anyhow::Result;
use plotpipe::{Error, Matrix, Value};

use common::{echo_engine, history, separator_engine, started, PIPE_REPLY, WHITESPACE_REPLY};

#[tokio::test]
async fn file_rows_use_engine_separator() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let mut session = started(separator_engine(PIPE_REPLY), dir.path());

    let m = Matrix::new(vec![
        vec![Value::from(1), Value::from(2)],
        vec![Value::from("a"), Value::from("b")],
    ]);
    let path = dir.path().join("d1");
    session.write_file(&path, &m).await?;

    assert_eq!(fs::read_to_string(&path)?, "1|a\n2|b\n");
    Ok(())
}

#[tokio::test]
async fn whitespace_separator_and_number_formatting() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let mut session = started(separator_engine(WHITESPACE_REPLY), dir.path());

    let m = Matrix::default()
        .with_column([0.5, 1e7, 0.00001])
        .with_column([10.0, 2.0 / 3.0, -4.0])
        .with_column(["2024-01-01T00:00:00", "2024-01-02T00:00:00", "2024-01-03T00:00:00"])
        .with_column([100, 200, 300]);
    let path = dir.path().join("mixed.dat");
    session.write_file(&path, &m).await?;

    let text = fs::read_to_string(&path)?;
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 3);
    assert!(lines.iter().all(|l| l.split(' ').count() == 4));
    assert_eq!(lines[0], "0.5 10 2024-01-01T00:00:00 100");
    assert_eq!(lines[1], "1e+07 0.666667 2024-01-02T00:00:00 200");
    assert_eq!(lines[2], "1e-05 -4 2024-01-03T00:00:00 300");
    assert!(text.ends_with('\n'));
    Ok(())
}

#[tokio::test]
async fn ragged_matrix_leaves_no_file() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let mut session = started(separator_engine(PIPE_REPLY), dir.path());

    let m = Matrix::default().with_column([1, 2, 3]).with_column([4, 5]);
    let path = dir.path().join("ragged.dat");
    let err = session.write_file(&path, &m).await.unwrap_err();

    assert!(matches!(err, Error::Shape { column: 1, expected: 3, found: 2 }));
    assert!(!path.exists());
    assert_eq!(session.data_files().count(), 0);
    // The engine was never asked for its separator
    session.teardown();
    assert_eq!(history(dir.path()), "");
    Ok(())
}

#[tokio::test]
async fn unparsable_separator_reply_leaves_no_file() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let mut session = started(separator_engine("no idea"), dir.path());

    let m = Matrix::default().with_column([1, 2]);
    let path = dir.path().join("d2.dat");
    let err = session.write_file(&path, &m).await.unwrap_err();

    assert!(matches!(err, Error::ProtocolParse { ref reply } if reply == "no idea\n"));
    assert!(!path.exists());
    Ok(())
}

#[tokio::test]
async fn silent_engine_is_a_protocol_error() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let mut session = started(echo_engine(), dir.path());
    // cat echoes the question back, which names no separator
    assert!(matches!(
        session.resolve_separator().await,
        Err(Error::ProtocolParse { .. })
    ));
    Ok(())
}

#[tokio::test]
async fn resolve_separator_reports_both_shapes() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let mut pipe = started(separator_engine(PIPE_REPLY), dir.path());
    assert_eq!(pipe.resolve_separator().await?, "|");

    let dir = tempfile::tempdir()?;
    let mut ws = started(separator_engine(WHITESPACE_REPLY), dir.path());
    assert_eq!(ws.resolve_separator().await?, " ");
    Ok(())
}

#[tokio::test]
async fn inline_block_goes_out_as_one_command() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let mut session = started(echo_engine(), dir.path());

    let name = session.write_inline("pts", &["1 1", "2 4", "3 9"]).await?;
    assert_eq!(name, "$pts");
    let echoed = session.query("plot $pts").await?;
    assert!(echoed.ends_with("plot $pts\n"));

    session
        .write_inline_with("raw", &[String::from("a b")], "END")
        .await?;
    assert_eq!(session.data_files().count(), 0);
    session.teardown();

    assert_eq!(
        history(dir.path()),
        "$pts << EOD\n1 1\n2 4\n3 9\nEOD\nplot $pts\n$raw << END\na b\nEND\n"
    );
    Ok(())
}

#[tokio::test]
async fn early_cleanup_removes_one_file() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let mut session = started(separator_engine(PIPE_REPLY), dir.path());

    let m = Matrix::default().with_column([1]);
    let keep = dir.path().join("keep.dat");
    let drop = dir.path().join("drop.dat");
    session.write_file(&keep, &m).await?;
    session.write_file(&drop, &m).await?;

    assert!(session.remove_data_file(&drop));
    assert!(!drop.exists());
    assert!(keep.exists());
    assert!(!session.remove_data_file(&drop));

    session.teardown();
    assert!(!keep.exists());
    Ok(())
}

#[tokio::test]
async fn rewriting_a_name_replaces_its_contents() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let mut session = started(separator_engine(PIPE_REPLY), dir.path());

    let path = dir.path().join("d.dat");
    session
        .write_file(&path, &Matrix::default().with_column([1, 2, 3]))
        .await?;
    session
        .write_file(&path, &Matrix::default().with_column([7]).with_column([8]))
        .await?;

    assert_eq!(fs::read_to_string(&path)?, "7|8\n");
    assert_eq!(session.data_files().count(), 1);
    Ok(())
}

#[tokio::test]
async fn earlier_output_cannot_pose_as_the_separator() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let mut session = started(separator_engine(WHITESPACE_REPLY), dir.path());

    // Leaves `"oops"` waiting on the engine's stdout
    session
        .send_with_delay("print stray", Duration::from_millis(100))
        .await?;
    assert_eq!(session.resolve_separator().await?, " ");

    let path = dir.path().join("after.dat");
    session
        .write_file(&path, &Matrix::default().with_column([1]).with_column([2]))
        .await?;
    assert_eq!(fs::read_to_string(&path)?, "1 2\n");
    Ok(())
}

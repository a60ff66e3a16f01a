// Device Bridge Rust Source Code File
//
// Licensed under the BSD 3-Clause license. See LICENSE file in the project root
// for full license information.

use futures::future::Future;

/// Spawns a future on the Tokio runtime. Centralized so a future wasm/alternate-executor backend
/// only needs one seam to change.
pub fn spawn<Fut>(future: Fut)
where
  Fut: Future<Output = ()> + Send + 'static,
{
  tokio::spawn(future);
}

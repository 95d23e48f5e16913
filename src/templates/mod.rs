/// Returns the system instruction sent alongside a `project.json` when converting.
///
/// The model is told where assets live (`assets/`, see [`crate::archive::ASSETS_DIR`])
/// and that its reply is saved as-is, so it must answer with bare Python source.
pub fn conversion_prompt() -> &'static str {
    r#"You convert Scratch 3 projects into Python programs built on Pygame.

Input: the complete JSON text of a Scratch `project.json`.

Output: nothing but the Python source of one runnable Pygame program. No prose, no explanations, no Markdown fences. Your reply is saved verbatim as `main.py`.

Rules:

1. Aim for behavior as close to the Scratch project as Pygame allows.
2. Prefer a program that runs over a complete one. Features that are very hard to reproduce (elaborate custom blocks, pen drawing, heavy cloning) may be simplified or left out.
3. Assets:
   - Every costume and sound of the project is extracted next to the program in an `assets/` directory, under the file name recorded in `project.json` (its `md5ext`).
   - Load them from there, e.g. `pygame.image.load(os.path.join('assets', 'costume1.png'))`.
4. Scratch to Pygame mapping:
   - Stage: the main display surface.
   - Sprites: classes deriving from `pygame.sprite.Sprite`, each owning its costumes.
   - Costumes: `pygame.Surface` objects loaded from `assets/`.
   - Sounds: `pygame.mixer.Sound` objects loaded from `assets/`.
   - Variables: module globals or class attributes.
   - `when green flag clicked`: setup code that runs before the main loop.
   - `forever`: the body of the main `while` loop.
   - `when key pressed` / `when this sprite clicked`: handled while iterating `pygame.event.get()`.
   - Broadcasts: custom `pygame.USEREVENT` events or direct method calls.
   - Motion blocks: changes to `self.rect.x` / `self.rect.y`.
   - Looks blocks (show, hide, switch costume): visibility flags and the active `self.image`.
   - Sensing (`touching ...?`): `pygame.sprite.spritecollide()` or `self.rect.colliderect()`.
5. Structure:
   - One self-contained script.
   - Imports first (`pygame`, `os`, `sys`), then Pygame and display initialisation, then sprite classes, then the main loop.
   - Handle `pygame.QUIT` and exit cleanly.
"#
}

/// Returns the chat page served by the relay at `/`.
pub fn index_html() -> &'static str {
    include_str!("index.html")
}
